//! Then steps for order lifecycle BDD scenarios.

use super::world::{OrderLifecycleWorld, run_async};
use codline::order::{
    adapters::memory::RecordedPush,
    domain::{OrderDomainError, OrderStatus},
    ports::OrderRepository,
    services::{DispositionError, EditError},
};
use rstest_bdd_macros::then;

#[then("the order book holds {count:u64} orders")]
fn order_book_holds(world: &OrderLifecycleWorld, count: u64) -> Result<(), eyre::Report> {
    let counts = run_async(world.orders.count_by_status())?;
    if counts.total() != count {
        return Err(eyre::eyre!("expected {count} orders, found {counts:?}"));
    }
    Ok(())
}

#[then(r#"order "{external_id}" has status "{status}""#)]
fn order_has_status(
    world: &OrderLifecycleWorld,
    external_id: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = OrderStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let order = world.order(&external_id)?;
    if order.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            order.status().as_str()
        ));
    }
    Ok(())
}

#[then(r#"order "{external_id}" is assigned to "{agent}""#)]
fn order_is_assigned_to(
    world: &OrderLifecycleWorld,
    external_id: String,
    agent: String,
) -> Result<(), eyre::Report> {
    let agent_id = world.agent(&agent)?.id();
    let order = world.order(&external_id)?;
    if order.assigned_to() != Some(agent_id) {
        return Err(eyre::eyre!(
            "expected {external_id} to be assigned to {agent}, found {:?}",
            order.assigned_to()
        ));
    }
    Ok(())
}

#[then(r#"order "{external_id}" has final status "{label}""#)]
fn order_has_final_status(
    world: &OrderLifecycleWorld,
    external_id: String,
    label: String,
) -> Result<(), eyre::Report> {
    let order = world.order(&external_id)?;
    let found = order.final_status().map(|code| code.label());
    if found != Some(label.as_str()) {
        return Err(eyre::eyre!("expected final status {label}, found {found:?}"));
    }
    Ok(())
}

#[then(r#"order "{external_id}" has {count:u32} attempts"#)]
fn order_has_attempts(
    world: &OrderLifecycleWorld,
    external_id: String,
    count: u32,
) -> Result<(), eyre::Report> {
    let order = world.order(&external_id)?;
    if order.attempts() != count {
        return Err(eyre::eyre!(
            "expected {count} attempts, found {}",
            order.attempts()
        ));
    }
    Ok(())
}

#[then(r#"order "{external_id}" has {count:usize} call log entries"#)]
fn order_has_call_logs(
    world: &OrderLifecycleWorld,
    external_id: String,
    count: usize,
) -> Result<(), eyre::Report> {
    let order = world.order(&external_id)?;
    let logs = run_async(world.orders.call_logs_for_order(order.id()))?;
    if logs.len() != count {
        return Err(eyre::eyre!(
            "expected {count} call log entries, found {}",
            logs.len()
        ));
    }
    Ok(())
}

#[then(r#"order "{external_id}" is in the queue of "{agent}""#)]
fn order_is_queued(
    world: &OrderLifecycleWorld,
    external_id: String,
    agent: String,
) -> Result<(), eyre::Report> {
    let agent_id = world.agent(&agent)?.id();
    let queue = run_async(world.orders.queue_for_agent(agent_id))?;
    if !queue
        .iter()
        .any(|order| order.external_id().as_str() == external_id)
    {
        return Err(eyre::eyre!("{external_id} is not in the queue of {agent}"));
    }
    Ok(())
}

#[then(r#"the source received tag "{tag}" for order "{external_id}""#)]
fn source_received_tag(
    world: &OrderLifecycleWorld,
    tag: String,
    external_id: String,
) -> Result<(), eyre::Report> {
    let received = world.source.pushes().into_iter().any(|push| match push {
        RecordedPush::Tags {
            external_id: target,
            tags,
        } => {
            target.as_str() == external_id
                && tags.iter().any(|pushed| pushed.as_str() == tag)
        }
        RecordedPush::CustomerInfo { .. } => false,
    });
    if !received {
        return Err(eyre::eyre!(
            "tag {tag} was not pushed for {external_id}: {:?}",
            world.source.pushes()
        ));
    }
    Ok(())
}

#[then("the source received no updates")]
fn source_received_nothing(world: &OrderLifecycleWorld) -> Result<(), eyre::Report> {
    let pushes = world.source.pushes();
    if !pushes.is_empty() {
        return Err(eyre::eyre!("expected no pushes, found {pushes:?}"));
    }
    Ok(())
}

#[then("the disposition is rejected as invalid")]
fn disposition_is_rejected(world: &OrderLifecycleWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_disposition
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing disposition result"))?;
    if !matches!(
        result,
        Err(DispositionError::Domain(
            OrderDomainError::InvalidDisposition(_)
        ))
    ) {
        return Err(eyre::eyre!(
            "expected InvalidDisposition error, got {result:?}"
        ));
    }
    Ok(())
}

#[then("the edit is rejected as an invalid phone")]
fn edit_is_rejected(world: &OrderLifecycleWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_edit
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing edit result"))?;
    if !matches!(
        result,
        Err(EditError::Domain(OrderDomainError::InvalidPhone(_)))
    ) {
        return Err(eyre::eyre!("expected InvalidPhone error, got {result:?}"));
    }
    Ok(())
}

#[then(r#"order "{external_id}" has no contact edit"#)]
fn order_has_no_edit(world: &OrderLifecycleWorld, external_id: String) -> Result<(), eyre::Report> {
    let order = world.order(&external_id)?;
    if order.edit().is_some() {
        return Err(eyre::eyre!("expected no contact edit on {external_id}"));
    }
    Ok(())
}
