//! Basic example demonstrating the Podio API client.
//!
//! Run with:
//! ```
//! PODIO_CLIENT_ID=... PODIO_CLIENT_SECRET=... \
//! PODIO_USERNAME=me@example.com PODIO_PASSWORD=... \
//! cargo run --example basic -- my-org
//! ```

use podioapi::{FileListQuery, ItemFilter, PaginationParams, Session};

#[tokio::main]
async fn main() -> podioapi::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    let org_label = std::env::args().nth(1).unwrap_or_else(|| "my-org".to_string());

    println!("Creating Podio session...");
    let session = Session::from_env()?;
    println!("API: {}", session.base_url());

    println!("\n--- Organization ---");
    let org = podioapi::Organization::get_by_url(&session, &org_label).await?;
    println!("{} (id {})", org.name().unwrap_or("<unnamed>"), org.org_id());

    println!("\n--- Spaces ---");
    let spaces = org.spaces().await?;
    for space in &spaces {
        println!("  - {} (id {})", space.name().unwrap_or("<unnamed>"), space.space_id());
    }

    if let Some(space) = spaces.first() {
        println!("\n--- Apps in {} ---", space.name().unwrap_or("first space"));
        let apps = space.apps().await?;
        for app in &apps {
            println!("  - {} (id {})", app.name().unwrap_or("<unnamed>"), app.app_id());
        }

        if let Some(app) = apps.first() {
            let page = app
                .filter_items(&ItemFilter::new().page(PaginationParams::new(5, 0)))
                .await?;
            println!("\nFirst {} items (of {:?}):", page.len(), page.total);
            for item in &page {
                println!("  - {}", item.title().unwrap_or("<untitled>"));
            }
        }

        println!("\n--- Files ---");
        let files = space.files(&FileListQuery::new().sort_by("created_on", true)).await?;
        for file in files.iter().take(5) {
            println!("  - {} ({:?} bytes)", file.name().unwrap_or("<unnamed>"), file.size());
        }

        println!("\n--- Members ---");
        for member in space.members().await? {
            println!(
                "  - {} ({})",
                member.name().unwrap_or("<unknown>"),
                member.role().unwrap_or("?")
            );
        }
    }

    if session.refresh_token().await.is_some() {
        println!("\nA refresh token is known; later logins will use the refresh grant.");
    }

    session.close().await;
    println!("\nDone!");
    Ok(())
}
