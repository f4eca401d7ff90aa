//! When steps for task catalogue scenarios.

use super::world::{CatalogueWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskflow::task::{
    domain::{DataVersion, FilterState, NewTask, Priority, TaskId},
    ports::StorageAdapter,
};

#[when(r#"I search for "{query}""#)]
fn search_for(world: &mut CatalogueWorld, query: String) {
    world.results = run_async(world.service.search_tasks(&query));
}

#[when(r#"I filter by tag "{tag}""#)]
fn filter_by_tag(world: &mut CatalogueWorld, tag: String) -> Result<(), eyre::Report> {
    world.results = run_async(world.service.filter_tasks(&FilterState::new().with_tag(tag)))
        .wrap_err("filter by tag")?;
    Ok(())
}

#[when(r#"I toggle completion of "{title}" twice"#)]
fn toggle_twice(world: &mut CatalogueWorld, title: String) -> Result<(), eyre::Report> {
    let id = world.task(&title)?.id();
    run_async(world.service.toggle_task_completion(id)).wrap_err("first toggle")?;
    let toggled = run_async(world.service.toggle_task_completion(id)).wrap_err("second toggle")?;
    world.toggled = Some(toggled);
    Ok(())
}

#[when(r#"I request the navigation context of "{title}" filtered by tag "{tag}""#)]
fn navigation_context(
    world: &mut CatalogueWorld,
    title: String,
    tag: String,
) -> Result<(), eyre::Report> {
    let id = world.task(&title)?.id();
    let filter = FilterState::new().with_tag(tag);
    let context = run_async(world.service.task_navigation_context(id, Some(&filter)))
        .wrap_err("navigation context")?;
    world.navigation = Some(context);
    Ok(())
}

#[when(r#"I set the priority of {count:usize} unknown tasks and "{title}" to high"#)]
fn bulk_priority_over_limit(
    world: &mut CatalogueWorld,
    count: usize,
    title: String,
) -> Result<(), eyre::Report> {
    let mut ids: Vec<TaskId> = (0..count).map(|_| TaskId::new()).collect();
    ids.push(world.task(&title)?.id());
    match run_async(world.service.bulk_set_priority(&ids, Priority::High)) {
        Ok(outcome) => world.last_outcome = Some(outcome),
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when(r#"I bulk delete "{title}" and an unknown task"#)]
fn bulk_delete_with_unknown(world: &mut CatalogueWorld, title: String) -> Result<(), eyre::Report> {
    let ids = [world.task(&title)?.id(), TaskId::new()];
    let outcome =
        run_async(world.service.delete_multiple_tasks(&ids)).wrap_err("bulk delete")?;
    world.last_outcome = Some(outcome);
    Ok(())
}

#[when("I delete an unknown task")]
fn delete_unknown(world: &mut CatalogueWorld) {
    world.last_error = run_async(world.service.delete_task(TaskId::new())).err();
}

#[when("I create a task with a blank title")]
fn create_blank(world: &mut CatalogueWorld) {
    world.last_error = run_async(world.service.create_task(NewTask::new("   "))).err();
}

#[when("I save the loaded tasks back to storage")]
fn save_loaded(world: &mut CatalogueWorld) -> Result<(), eyre::Report> {
    let loaded = run_async(world.storage.load_tasks()).wrap_err("load tasks")?;
    run_async(world.storage.save_tasks(&loaded)).wrap_err("save tasks")?;
    world.saved = loaded;
    Ok(())
}

#[when("the data is migrated from 1.0 to 1.1")]
fn migrate_once(world: &mut CatalogueWorld) -> Result<(), eyre::Report> {
    let (storage, document) = world
        .legacy
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing legacy document in scenario world"))?;
    run_async(storage.migrate_data(DataVersion::V1_0, DataVersion::V1_1))
        .wrap_err("first migration")?;
    world.migrated_once = document.contents();
    Ok(())
}

#[when("the data is migrated from 1.0 to 1.1 again")]
fn migrate_again(world: &mut CatalogueWorld) -> Result<(), eyre::Report> {
    let (storage, document) = world
        .legacy
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing legacy document in scenario world"))?;
    run_async(storage.migrate_data(DataVersion::V1_0, DataVersion::V1_1))
        .wrap_err("second migration")?;
    world.migrated_twice = document.contents();
    Ok(())
}
