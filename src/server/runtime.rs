//! Listener binding, accept loops and orderly shutdown.

use super::{ServerContext, TransportError, health::health_routes, transport};
use crate::config::TransportKind;
use mockable::Clock;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

const CONNECTION_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// A server whose listeners are bound but not yet accepting.
pub struct BoundServer<C>
where
    C: Clock + Send + Sync + 'static,
{
    context: Arc<ServerContext<C>>,
    agents: TcpListener,
    health: TcpListener,
}

async fn bind_listener(host: &str, port: u16) -> Result<TcpListener, TransportError> {
    let address = format!("{host}:{port}");
    TcpListener::bind(address.as_str())
        .await
        .map_err(|source| TransportError::Bind { address, source })
}

async fn stopped(mut signal: watch::Receiver<bool>) {
    while !*signal.borrow_and_update() {
        if signal.changed().await.is_err() {
            return;
        }
    }
}

impl<C> BoundServer<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Binds the agent and health listeners named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Bind`] when either address is unavailable.
    pub async fn bind(context: Arc<ServerContext<C>>) -> Result<Self, TransportError> {
        let server = &context.config().server;
        let agents = bind_listener(&server.host, server.port).await?;
        let health = bind_listener(&server.host, server.health_port).await?;
        Ok(Self {
            context,
            agents,
            health,
        })
    }

    /// Returns the bound agent transport address.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the socket has no local address.
    pub fn agent_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.agents.local_addr()?)
    }

    /// Returns the bound health endpoint address.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the socket has no local address.
    pub fn health_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.health.local_addr()?)
    }

    /// Accepts connections until `shutdown` resolves, then closes every
    /// session and stops the sweeper and the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Health`] when the health endpoint fails.
    pub async fn run<F>(self, shutdown: F) -> Result<(), TransportError>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            context,
            agents,
            health,
        } = self;
        let transport_kind = context.config().server.transport;
        tracing::info!(
            address = %agents.local_addr()?,
            transport = %transport_kind,
            "accepting agent connections"
        );

        let sweeper = context
            .supervisor()
            .spawn_sweeper(context.shutdown_signal());
        let health_task = tokio::spawn(
            axum::serve(health, health_routes(Arc::clone(&context)))
                .with_graceful_shutdown(stopped(context.shutdown_signal()))
                .into_future(),
        );

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = agents.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(serve_connection(
                            Arc::clone(&context),
                            transport_kind,
                            stream,
                            peer,
                        ));
                    }
                    Err(err) => tracing::warn!(error = %err, "accept failed"),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(err) = joined {
                        tracing::warn!(error = %err, "connection task failed");
                    }
                }
            }
        }

        drop(agents);
        let closed = context.shutdown();
        tracing::info!(agents = closed, "sessions closed");
        if tokio::time::timeout(CONNECTION_DRAIN_TIMEOUT, drain(&mut connections))
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = connections.len(),
                "connections still open after shutdown"
            );
            connections.abort_all();
        }
        if let Err(err) = sweeper.await {
            tracing::warn!(error = %err, "sweeper task failed");
        }
        match health_task.await {
            Ok(result) => result.map_err(TransportError::Health),
            Err(err) => {
                tracing::warn!(error = %err, "health task failed");
                Ok(())
            }
        }
    }
}

async fn drain(connections: &mut JoinSet<()>) {
    while connections.join_next().await.is_some() {}
}

async fn serve_connection<C>(
    context: Arc<ServerContext<C>>,
    transport_kind: TransportKind,
    stream: TcpStream,
    peer: SocketAddr,
) where
    C: Clock + Send + Sync + 'static,
{
    if context.is_shutting_down() {
        return;
    }
    tracing::info!(%peer, "connection accepted");
    let supervisor = Arc::clone(context.supervisor());
    let outcome = match transport_kind {
        TransportKind::Websocket => transport::serve_websocket(supervisor, stream).await,
        TransportKind::Tcp => Ok(transport::serve_tcp(supervisor, stream).await),
    };
    match outcome {
        Ok(reason) => tracing::info!(%peer, reason = %reason, "connection closed"),
        Err(err) => tracing::info!(%peer, error = %err, "connection failed"),
    }
}
