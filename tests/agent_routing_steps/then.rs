//! Then steps for agent routing BDD scenarios.

use super::world::RoutingWorld;
use crate::test_helpers::error_code;
use agora::envelope::domain::{AgentId, CorrelationId, EnvelopeKind};
use agora::registry::domain::AgentStatus;
use agora::session::{domain::CloseReason, services::SessionStep};
use rstest_bdd_macros::then;
use serde_json::json;

#[then(r#""{name}" receives the request forwarded from "{origin}""#)]
fn receives_forwarded_request(
    world: &mut RoutingWorld,
    name: String,
    origin: String,
) -> Result<(), eyre::Report> {
    let (_, original) = world
        .last_request
        .clone()
        .ok_or_else(|| eyre::eyre!("no request was sent"))?;
    let delivered = world.agent(&name)?.take();
    let [forwarded] = delivered.as_slice() else {
        return Err(eyre::eyre!("expected one forwarded envelope, got {delivered:?}"));
    };
    if forwarded.sender().map(AgentId::as_str) != Some(origin.as_str()) {
        return Err(eyre::eyre!("forwarded request not attributed to {origin}"));
    }
    let forwarded_id = forwarded
        .id()
        .cloned()
        .ok_or_else(|| eyre::eyre!("forwarded request has no id"))?;
    if forwarded_id.to_json() == json!(original) {
        return Err(eyre::eyre!("forwarded request reused the originator's id"));
    }
    world.forwarded_id = Some(forwarded_id);
    Ok(())
}

#[then(r#""{name}" receives the answer under its own id"#)]
fn receives_answer(world: &mut RoutingWorld, name: String) -> Result<(), eyre::Report> {
    let (_, original) = world
        .last_request
        .clone()
        .ok_or_else(|| eyre::eyre!("no request was sent"))?;
    let delivered = world.agent(&name)?.take();
    let [reply] = delivered.as_slice() else {
        return Err(eyre::eyre!("expected one reply, got {delivered:?}"));
    };
    if reply.kind() != EnvelopeKind::Response {
        return Err(eyre::eyre!("expected a response, got {reply:?}"));
    }
    if reply.id().map(CorrelationId::to_json) != Some(json!(original)) {
        return Err(eyre::eyre!("reply id does not match request id {original}"));
    }
    Ok(())
}

#[then(r#""{name}" receives a "{kind}" error"#)]
fn receives_error(world: &mut RoutingWorld, name: String, kind: String) -> Result<(), eyre::Report> {
    let delivered = world.agent(&name)?.take();
    let [reply] = delivered.as_slice() else {
        return Err(eyre::eyre!("expected one error, got {delivered:?}"));
    };
    let code = error_code(reply).map(|code| code.as_str());
    if code != Some(kind.as_str()) {
        return Err(eyre::eyre!("expected {kind}, got {code:?}"));
    }
    Ok(())
}

#[then(r#"the handshake fails with "{kind}""#)]
fn handshake_fails_with(world: &mut RoutingWorld, kind: String) -> Result<(), eyre::Report> {
    if world.handshake_step != Some(SessionStep::Close(CloseReason::HandshakeRejected)) {
        return Err(eyre::eyre!(
            "expected the handshake to be rejected, got {:?}",
            world.handshake_step
        ));
    }
    let challenger = world
        .challenger
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no second connection was opened"))?;
    let delivered = challenger.take();
    let code = delivered
        .first()
        .and_then(error_code)
        .map(|code| code.as_str());
    if code != Some(kind.as_str()) {
        return Err(eyre::eyre!("expected {kind}, got {code:?}"));
    }
    Ok(())
}

#[then(r#"the agent "{name}" is still registered"#)]
fn agent_still_registered(world: &mut RoutingWorld, name: String) -> Result<(), eyre::Report> {
    registered_status(world, &name)?
        .map(|_| ())
        .ok_or_else(|| eyre::eyre!("agent '{name}' was removed"))
}

#[then(r#"the agent "{name}" is "{status}""#)]
fn agent_has_status(world: &mut RoutingWorld, name: String, status: String) -> Result<(), eyre::Report> {
    let actual = registered_status(world, &name)?
        .ok_or_else(|| eyre::eyre!("agent '{name}' is not registered"))?;
    if actual.as_str() != status {
        return Err(eyre::eyre!("expected {status}, got {actual}"));
    }
    Ok(())
}

#[then(r#"the agent "{name}" is no longer registered"#)]
fn agent_no_longer_registered(world: &mut RoutingWorld, name: String) -> Result<(), eyre::Report> {
    if registered_status(world, &name)?.is_some() {
        return Err(eyre::eyre!("agent '{name}' is still registered"));
    }
    Ok(())
}

fn registered_status(world: &RoutingWorld, name: &str) -> Result<Option<AgentStatus>, eyre::Report> {
    let id = AgentId::new(name).map_err(|err| eyre::eyre!("invalid agent id: {err}"))?;
    Ok(world
        .harness
        .context
        .registry()
        .lookup(&id)
        .ok()
        .map(|handle| handle.status()))
}
