//! Then steps for task catalogue scenarios.

use super::world::{CatalogueWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use std::collections::BTreeSet;
use taskflow::task::{
    domain::{Priority, Task, TaskId},
    ports::StorageAdapter,
    services::TaskServiceError,
};

fn result_titles(world: &CatalogueWorld) -> BTreeSet<&str> {
    world.results.iter().map(Task::title).collect()
}

#[then(r#"the results contain "{first}" and "{second}""#)]
fn results_contain_both(
    world: &CatalogueWorld,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    let expected = BTreeSet::from([first.as_str(), second.as_str()]);
    eyre::ensure!(
        result_titles(world) == expected,
        "expected {expected:?}, found {:?}",
        result_titles(world)
    );
    Ok(())
}

#[then(r#"the results contain only "{title}""#)]
fn results_contain_only(world: &CatalogueWorld, title: String) -> Result<(), eyre::Report> {
    let expected = BTreeSet::from([title.as_str()]);
    eyre::ensure!(
        result_titles(world) == expected,
        "expected {expected:?}, found {:?}",
        result_titles(world)
    );
    Ok(())
}

#[then(r#""{title}" is not completed and its update time has advanced"#)]
fn toggled_back(world: &CatalogueWorld, title: String) -> Result<(), eyre::Report> {
    let original = world.task(&title)?;
    let toggled = world
        .toggled
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing toggle result in scenario world"))?;
    eyre::ensure!(
        toggled.completed() == original.completed(),
        "completion flag not restored"
    );
    eyre::ensure!(
        toggled.updated_at() > original.updated_at(),
        "update time did not advance"
    );
    Ok(())
}

#[then("the context has no previous or next task")]
fn no_neighbours(world: &CatalogueWorld) -> Result<(), eyre::Report> {
    let context = world
        .navigation
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing navigation context in scenario world"))?;
    eyre::ensure!(context.total == 1, "expected a single match, found {}", context.total);
    eyre::ensure!(
        !context.has_previous() && !context.has_next(),
        "single match should have no neighbours"
    );
    Ok(())
}

#[then("the request fails with a validation error")]
fn fails_with_validation(world: &CatalogueWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        matches!(world.last_error, Some(TaskServiceError::Validation(_))),
        "expected validation error, got {:?}",
        world.last_error
    );
    Ok(())
}

#[then("the request fails with a not found error")]
fn fails_with_not_found(world: &CatalogueWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        matches!(world.last_error, Some(TaskServiceError::NotFound(_))),
        "expected not found error, got {:?}",
        world.last_error
    );
    Ok(())
}

#[then(r#""{title}" still has priority "{priority}""#)]
fn still_has_priority(
    world: &CatalogueWorld,
    title: String,
    priority: String,
) -> Result<(), eyre::Report> {
    let expected: Priority = priority.parse().wrap_err("parse scenario priority")?;
    let id = world.task(&title)?.id();
    let current = run_async(world.service.task(id))
        .ok_or_else(|| eyre::eyre!("task {title:?} disappeared"))?;
    eyre::ensure!(
        current.priority() == expected,
        "expected priority {expected}, found {}",
        current.priority()
    );
    Ok(())
}

#[then(r#"only "{title}" is reported as removed"#)]
fn only_removed(world: &CatalogueWorld, title: String) -> Result<(), eyre::Report> {
    let outcome = world
        .last_outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing bulk outcome in scenario world"))?;
    let expected: Vec<TaskId> = vec![world.task(&title)?.id()];
    eyre::ensure!(
        outcome.succeeded == expected,
        "unexpected removed ids {:?}",
        outcome.succeeded
    );
    Ok(())
}

#[then("one task is reported missing")]
fn one_missing(world: &CatalogueWorld) -> Result<(), eyre::Report> {
    let outcome = world
        .last_outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing bulk outcome in scenario world"))?;
    eyre::ensure!(
        outcome.missing.len() == 1,
        "expected one missing id, found {:?}",
        outcome.missing
    );
    Ok(())
}

#[then(r#"the catalogue holds only "{title}""#)]
fn catalogue_holds_only(world: &CatalogueWorld, title: String) -> Result<(), eyre::Report> {
    let titles: Vec<String> = run_async(world.service.tasks())
        .iter()
        .map(|task| task.title().to_owned())
        .collect();
    eyre::ensure!(titles == [title], "unexpected catalogue {titles:?}");
    Ok(())
}

#[then("the catalogue is empty")]
fn catalogue_is_empty(world: &CatalogueWorld) -> Result<(), eyre::Report> {
    let tasks = run_async(world.service.tasks());
    eyre::ensure!(tasks.is_empty(), "expected no tasks, found {}", tasks.len());
    Ok(())
}

#[then("loading the tasks again yields the same collection")]
fn reload_matches(world: &CatalogueWorld) -> Result<(), eyre::Report> {
    let reloaded = run_async(world.storage.load_tasks()).wrap_err("reload tasks")?;
    let by_id = |tasks: &[Task]| -> Vec<Task> {
        let mut sorted = tasks.to_vec();
        sorted.sort_by_key(Task::id);
        sorted
    };
    eyre::ensure!(world.saved.len() == 2, "expected two saved tasks");
    eyre::ensure!(
        by_id(&reloaded) == by_id(&world.saved),
        "reloaded collection differs from the saved one"
    );
    Ok(())
}

#[then("the second migration leaves the document unchanged")]
fn second_migration_unchanged(world: &CatalogueWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(world.migrated_once.is_some(), "first migration wrote nothing");
    eyre::ensure!(
        world.migrated_once == world.migrated_twice,
        "second migration changed the document"
    );
    Ok(())
}
