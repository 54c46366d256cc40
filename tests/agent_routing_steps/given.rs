//! Given steps for agent routing BDD scenarios.

use super::world::{RoutingWorld, run_async};
use agora::config::ServerConfig;
use rstest_bdd_macros::given;

#[given("calls time out after {seconds:u64} seconds")]
fn calls_time_out_after(world: &mut RoutingWorld, seconds: u64) -> Result<(), eyre::Report> {
    if !world.agents.is_empty() {
        return Err(eyre::eyre!("call timeout must be set before agents connect"));
    }
    let mut config = ServerConfig::default();
    config.router.call_timeout_ms = seconds.saturating_mul(1_000);
    *world = RoutingWorld::with_config(config);
    Ok(())
}

#[given(r#"a connected agent "{name}" without capabilities"#)]
fn a_connected_agent(world: &mut RoutingWorld, name: String) {
    let agent = run_async(world.harness.connect(&name, &[]));
    world.agents.insert(name, agent);
}

#[given(r#"a connected agent "{name}" offering "{capability}""#)]
fn a_connected_agent_offering(world: &mut RoutingWorld, name: String, capability: String) {
    let agent = run_async(world.harness.connect(&name, &[capability.as_str()]));
    world.agents.insert(name, agent);
}
