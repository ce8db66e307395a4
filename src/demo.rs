//! Demonstration walkthrough.
//!
//! Drives every operation of the access layer against the posts table in a
//! fixed order and prints what happened, ending with the query log. The
//! rollback leg provokes a real constraint violation and reacts to the
//! returned error, so failure handling stays ordinary `Result` control flow.

use tracing::info;

use crate::config::DemoConfig;
use crate::core::db::{ConnectionHandle, Params};
use crate::core::Result;
use crate::posts::{self, NewPost};

/// Runs the full walkthrough on the given connection.
pub fn run(handle: &mut ConnectionHandle, options: &DemoConfig) -> Result<()> {
    println!("== miniblog: posts walkthrough ==");
    println!(
        "database '{}' reachable: {}",
        handle.config().database,
        handle.ping()
    );

    posts::ensure_schema(handle)?;

    let seed = options.seed_posts.unwrap_or(0);
    for n in 1..=seed {
        posts::create(
            handle,
            &NewPost::new(format!("Seed {}", n), "Pre-existing filler content."),
        )?;
    }
    if seed > 0 {
        println!("seeded {} filler post(s)", seed);
    }

    // Create
    let mut welcome = NewPost::new("Welcome", "This blog runs on a tiny access layer.");
    welcome.image = Some("welcome.png".to_string());
    let first = posts::create(handle, &welcome)?;
    let second = posts::create(
        handle,
        &NewPost::new("Second post", "Mostly here to be archived."),
    )?;
    println!("created posts {} and {}", first, second);

    // Read
    if let Some(post) = posts::find(handle, first)? {
        println!(
            "post {}: '{}' ({} bytes of content)",
            post.id,
            post.title,
            post.content.len()
        );
    }

    // Update + archive
    let mut retitled = welcome.clone();
    retitled.title = "Welcome!".to_string();
    posts::update(handle, first, &retitled)?;
    posts::archive(handle, second)?;
    println!(
        "{} active of {} total",
        posts::list_active(handle)?.len(),
        posts::list(handle)?.len()
    );

    // Committed transaction: both inserts land together
    handle.begin_transaction()?;
    let third = posts::create(handle, &NewPost::new("Batch 1", "First of a pair."))?;
    let fourth = posts::create(handle, &NewPost::new("Batch 2", "Second of a pair."))?;
    handle.commit()?;
    println!("committed posts {} and {} together", third, fourth);

    // Rolled-back transaction: the second insert reuses an id on purpose,
    // and the whole span is undone when its error comes back.
    handle.begin_transaction()?;
    let doomed = posts::create(handle, &NewPost::new("Doomed", "Will never be visible."))?;
    let clash = handle.execute(
        "INSERT INTO tbl_posts (id, title, content) VALUES (:id, :title, :content)",
        &Params::new()
            .set("id", doomed)
            .set("title", "Clash")
            .set("content", "Duplicate id."),
    );
    match clash {
        Ok(_) => handle.commit()?,
        Err(err) => {
            println!("statement failed as arranged: {}", err);
            handle.rollback()?;
        }
    }
    println!(
        "post {} visible after rollback: {}",
        doomed,
        posts::find(handle, doomed)?.is_some()
    );

    // Delete
    let removed = posts::delete(handle, first)?;
    println!("deleted {} post(s)", removed);

    print_query_log(handle);

    if options.dump_log_json.unwrap_or(false) {
        println!("{}", handle.query_log().to_json()?);
    }

    info!(
        "Walkthrough finished with {} logged statement(s)",
        handle.query_log().len()
    );
    Ok(())
}

fn print_query_log(handle: &ConnectionHandle) {
    let log = handle.query_log();
    println!("-- query log: {} statement(s) --", log.len());
    for (index, entry) in log.entries().iter().enumerate() {
        println!("{:>3}. {}", index + 1, entry);
    }
}
