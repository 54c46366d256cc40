//! When steps for agent routing BDD scenarios.

use super::world::{RoutingWorld, run_async};
use agora::session::domain::CloseReason;
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::when;
use serde_json::json;

#[when(r#""{name}" sends a "{method}" request"#)]
fn sends_a_request(world: &mut RoutingWorld, name: String, method: String) -> Result<(), eyre::Report> {
    let agent = world.agent(&name)?;
    run_async(agent.request(&method, json!({"text": "hola"})));
    let id = agent.last_id();
    world.last_request = Some((name, id));
    Ok(())
}

#[when(r#""{name}" answers the forwarded request"#)]
fn answers_forwarded_request(world: &mut RoutingWorld, name: String) -> Result<(), eyre::Report> {
    let forwarded_id = world
        .forwarded_id
        .clone()
        .ok_or_else(|| eyre::eyre!("no request was forwarded"))?;
    let agent = world.agent(&name)?;
    run_async(agent.send(&json!({
        "jsonrpc": "2.0",
        "id": forwarded_id.to_json(),
        "result": {"text": "hello"}
    })));
    Ok(())
}

#[when(r#""{name}" drops its connection"#)]
fn drops_its_connection(world: &mut RoutingWorld, name: String) -> Result<(), eyre::Report> {
    let mut agent = world
        .agents
        .remove(&name)
        .ok_or_else(|| eyre::eyre!("agent '{name}' is not part of the scenario"))?;
    agent.session.close(CloseReason::TransportClosed);
    Ok(())
}

#[when(r#"a second connection registers as "{name}""#)]
fn second_connection_registers(world: &mut RoutingWorld, name: String) -> Result<(), eyre::Report> {
    let mut challenger = world.harness.open();
    let step = run_async(challenger.request(
        "agent.register",
        json!({"agent_id": name, "capabilities": []}),
    ));
    world.handshake_step = Some(step);
    world.challenger = Some(challenger);
    Ok(())
}

#[when("{seconds:i64} seconds pass")]
fn seconds_pass(world: &mut RoutingWorld, seconds: i64) -> Result<(), eyre::Report> {
    let delta = TimeDelta::try_seconds(seconds)
        .ok_or_else(|| eyre::eyre!("{seconds} seconds is out of range"))
        .wrap_err("advance the scenario clock")?;
    world.harness.advance(delta);
    world.harness.sweep();
    Ok(())
}
