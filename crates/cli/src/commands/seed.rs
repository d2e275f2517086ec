//! Menu seeding command.

use sliceworks_api::db::menu::MenuRepository;
use sliceworks_api::models::NewMenuItem;

use super::{CommandError, connect};

/// Starter menu: (title, description, image, price).
const STARTER_MENU: &[(&str, &str, &str, &str)] = &[
    ("Veggie", "A garden of delight", "pizza1.png", "0.0038"),
    ("Pepperoni", "Spicy treat", "pizza2.png", "0.0042"),
    ("Margarita", "Essential classic", "pizza3.png", "0.0014"),
];

/// Insert the starter menu items.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let menu = MenuRepository::new(&pool);

    for (title, description, image, price) in STARTER_MENU {
        let price = price
            .parse()
            .map_err(|e| CommandError::InvalidInput(format!("bad seed price: {e}")))?;

        menu.add(&NewMenuItem {
            title: (*title).to_string(),
            description: (*description).to_string(),
            image: (*image).to_string(),
            price,
        })
        .await?;

        tracing::info!(title = %title, "menu item seeded");
    }

    tracing::info!("Seed complete!");
    Ok(())
}
