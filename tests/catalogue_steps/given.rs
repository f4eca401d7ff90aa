//! Given steps for task catalogue scenarios.

use super::world::{CatalogueWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use serde_json::json;
use taskflow::task::{
    adapters::{InMemoryStorage, MemoryDocument},
    domain::{NewTask, Priority, Task},
};

fn remember(world: &mut CatalogueWorld, task: Task) {
    world.tasks_by_title.insert(task.title().to_owned(), task);
}

#[given(r#"a task titled "{title}" with priority "{priority}""#)]
fn task_with_priority(
    world: &mut CatalogueWorld,
    title: String,
    priority: String,
) -> Result<(), eyre::Report> {
    let parsed: Priority = priority.parse().wrap_err("parse scenario priority")?;
    let task = run_async(
        world
            .service
            .create_task(NewTask::new(title).with_priority(parsed)),
    )
    .wrap_err("create prioritised task")?;
    remember(world, task);
    Ok(())
}

#[given(r#"a task titled "{title}" tagged "{tag}""#)]
fn task_with_tag(world: &mut CatalogueWorld, title: String, tag: String) -> Result<(), eyre::Report> {
    let task = run_async(world.service.create_task(NewTask::new(title).with_tags([tag])))
        .wrap_err("create tagged task")?;
    remember(world, task);
    Ok(())
}

#[given("a stored document at version 1.0")]
fn legacy_document(world: &mut CatalogueWorld) {
    let document = MemoryDocument::with_contents(
        json!({
            "tasks": [{
                "id": "3f2c9a10-7d4b-4e8a-b1c6-5a9e0d4f2b77",
                "title": "Old entry",
                "priority": "Medium",
                "createdAt": "2022-06-01T12:00:00Z"
            }]
        })
        .to_string(),
    );
    world.legacy = Some((InMemoryStorage::new(document.clone()), document));
}
