//! Given steps for order lifecycle BDD scenarios.

use super::world::{OrderLifecycleWorld, run_async};
use codline::order::{
    domain::{Agent, AgentPin, OrderSource, SourceRecord, Store, StoreName},
    ports::RosterRepository,
    services::IngestionBatch,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a store "{name}""#)]
fn a_store(world: &mut OrderLifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let store = Store::new(StoreName::new(name.as_str())?, name.to_lowercase(), &*world.clock);
    run_async(world.roster.register_store(&store)).wrap_err("register scenario store")?;
    world.bind_source(&store);
    world.stores.insert(name, store);
    Ok(())
}

#[given(r#"an agent "{name}" with PIN "{pin}""#)]
fn an_agent(world: &mut OrderLifecycleWorld, name: String, pin: String) -> Result<(), eyre::Report> {
    let agent = Agent::new(name.as_str(), AgentPin::new(pin)?, &*world.clock)?;
    run_async(world.roster.register_agent(&agent)).wrap_err("register scenario agent")?;
    world.agents.insert(name, agent);
    Ok(())
}

#[given(r#"order "{external_id}" with phone "{phone}" is waiting"#)]
fn order_is_waiting(
    world: &mut OrderLifecycleWorld,
    external_id: String,
    phone: String,
) -> Result<(), eyre::Report> {
    let record = SourceRecord {
        external_id: external_id.clone(),
        customer_name: "Asha Rao".to_owned(),
        phone,
        address: "12 MG Road, Pune".to_owned(),
        postal_code: "411001".to_owned(),
        product_name: "Steel Bottle".to_owned(),
        price: "499".to_owned(),
        quantity: "1".to_owned(),
        ..SourceRecord::default()
    };
    let report = run_async(
        world
            .ingestion()
            .ingest(IngestionBatch::new(vec![record], OrderSource::StorefrontOrder)),
    )
    .wrap_err("ingest scenario order")?;
    if report.imported != 1 {
        return Err(eyre::eyre!("expected {external_id} to be imported, got {report:?}"));
    }
    Ok(())
}

#[given(r#""{store}" is covered by "{agent}" today"#)]
fn store_is_covered(
    world: &mut OrderLifecycleWorld,
    store: String,
    agent: String,
) -> Result<(), eyre::Report> {
    let store_id = world.store(&store)?.id();
    let agent_id = world.agent(&agent)?.id();
    run_async(world.planner().assign_store(store_id, agent_id, None))
        .wrap_err("assign store for scenario")?;
    Ok(())
}
