//! Behaviour tests for the task catalogue service.

mod catalogue_steps;

use catalogue_steps::world::{CatalogueWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/task_catalogue.feature",
    name = "Search and filter tasks by text and tag"
)]
#[tokio::test(flavor = "multi_thread")]
async fn search_and_filter(world: CatalogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_catalogue.feature",
    name = "Toggling completion twice restores the flag"
)]
#[tokio::test(flavor = "multi_thread")]
async fn toggle_twice(world: CatalogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_catalogue.feature",
    name = "Navigation within a single match has no neighbours"
)]
#[tokio::test(flavor = "multi_thread")]
async fn navigation_single_match(world: CatalogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_catalogue.feature",
    name = "Bulk request over the limit mutates nothing"
)]
#[tokio::test(flavor = "multi_thread")]
async fn bulk_over_limit(world: CatalogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_catalogue.feature",
    name = "Bulk delete skips a missing task"
)]
#[tokio::test(flavor = "multi_thread")]
async fn bulk_delete_with_missing(world: CatalogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_catalogue.feature",
    name = "Deleting an unknown task fails"
)]
#[tokio::test(flavor = "multi_thread")]
async fn delete_unknown(world: CatalogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_catalogue.feature",
    name = "Creating a task with a blank title fails"
)]
#[tokio::test(flavor = "multi_thread")]
async fn blank_title(world: CatalogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_catalogue.feature",
    name = "Persistence round trip is lossless"
)]
#[tokio::test(flavor = "multi_thread")]
async fn persistence_round_trip(world: CatalogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_catalogue.feature",
    name = "Migrating twice matches migrating once"
)]
#[tokio::test(flavor = "multi_thread")]
async fn migrate_twice(world: CatalogueWorld) {
    let _ = world;
}
