use product_catalog_api::{config::AppConfig, db::connect_store, models::NewProduct};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let store = connect_store(&config).await?;
    store.ping().await?;

    let existing = store.find_all().await?;
    if !existing.is_empty() {
        println!(
            "Store already holds {} products, nothing to seed",
            existing.len()
        );
        return Ok(());
    }

    let products = vec![
        ("Axum Hoodie", 50, 55.0, Some("https://example.com/img/hoodie.png")),
        ("Ferris Mug", 100, 12.0, Some("https://example.com/img/mug.png")),
        ("Rust Sticker Pack", 200, 5.0, None),
        ("E-book: Async Rust", 0, 25.0, None),
    ];

    for (name, quantity, price, img) in products {
        let product = store
            .insert(NewProduct {
                name: name.to_string(),
                quantity,
                price,
                img: img.map(str::to_string),
            })
            .await?;
        println!("Seeded {} ({})", product.name, product.id);
    }

    println!("Seed completed on {} backend", store.backend());
    Ok(())
}
