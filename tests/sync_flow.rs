use cart_sync_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        cart_lines::ActiveModel as CartLineActive,
        carts::{ActiveModel as CartActive, Entity as Carts},
        currencies::ActiveModel as CurrencyActive,
        customers::ActiveModel as CustomerActive,
        orders::ActiveModel as OrderActive,
        products::ActiveModel as ProductActive,
        shop_settings::ActiveModel as ShopSettingsActive,
        sync_records::{Column as SyncCol, Entity as SyncRecords},
        taxes::{ActiveModel as TaxActive, Entity as Taxes},
    },
    error::AppError,
    recovery,
    services::{cart_sync, sync_state},
    state::AppState,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, Set, Statement,
};
use uuid::Uuid;

// Integration flow: provision a shop -> select abandoned carts -> mark synced
// -> modify a cart -> re-select; plus filter, boundary, and batch semantics.
#[tokio::test]
async fn abandoned_cart_sync_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run sync flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let shop_id = Uuid::new_v4();

    // Provision the shop: active 20% tax, default currency, sync settings
    // with the "carts last synchronized" marker set so the stale filter is
    // live from the start.
    let tax = TaxActive {
        id: Set(Uuid::new_v4()),
        name: Set("VAT 20%".into()),
        rate: Set(20.0),
        active: Set(true),
    }
    .insert(&state.orm)
    .await?;

    CurrencyActive {
        id: Set(Uuid::new_v4()),
        iso_code: Set("USD".into()),
        is_default: Set(true),
    }
    .insert(&state.orm)
    .await?;

    ShopSettingsActive {
        id: Set(Uuid::new_v4()),
        shop_id: Set(shop_id),
        tax_id: Set(Some(tax.id)),
        carts_synced_at: Set(Some((Utc::now() - Duration::hours(1)).into())),
    }
    .insert(&state.orm)
    .await?;

    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        email: Set("jane.doe@example.com".into()),
        first_name: Set("Jane".into()),
        last_name: Set("Doe".into()),
        newsletter: Set(true),
        language: Set("en".into()),
        birthday: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let hoodie = seed_product(&state, "Hoodie", 5_000).await?;
    let sticker = seed_product(&state, "Sticker", 2_500).await?;
    let attribute_id = Uuid::new_v4();

    // Cart A: 2 x 50.00 with a variant attribute. Cart B: 1 x 25.00, plain.
    let cart_a = seed_cart(&state, shop_id, customer.id, Utc::now()).await?;
    seed_line(&state, cart_a, hoodie, Some(attribute_id), 2).await?;
    let cart_b = seed_cart(&state, shop_id, customer.id, Utc::now()).await?;
    seed_line(&state, cart_b, sticker, None, 1).await?;

    // Out-of-window cart: modified 25h ago, never eligible.
    let stale_cart = seed_cart(&state, shop_id, customer.id, Utc::now() - Duration::hours(25)).await?;
    seed_line(&state, stale_cart, sticker, None, 1).await?;

    // Inside the window by a comfortable margin.
    let fresh_cart = seed_cart(&state, shop_id, customer.id, Utc::now() - Duration::hours(23)).await?;
    seed_line(&state, fresh_cart, sticker, None, 3).await?;

    // First pass: everything in the window and unsynced is selected.
    let payloads = cart_sync::select_carts(&state, shop_id, 0, None, true).await?;
    let ids: Vec<Uuid> = payloads.iter().map(|p| p.cart_id).collect();
    assert!(ids.contains(&cart_a) && ids.contains(&cart_b) && ids.contains(&fresh_cart));
    assert!(!ids.contains(&stale_cart), "25h-old cart must fall outside the window");
    assert_eq!(sync_state::count_remaining(&state.pool, shop_id, true).await?, 3);

    // Enrichment: tax-inclusive totals, variant composition, recovery link.
    let payload_a = payloads.iter().find(|p| p.cart_id == cart_a).unwrap();
    assert_eq!(payload_a.email, "jane.doe@example.com");
    assert_eq!(payload_a.first_name, "Jane");
    assert!(payload_a.newsletter);
    assert_eq!(payload_a.language, "en");
    assert_eq!(payload_a.currency_code, "USD");
    assert!((payload_a.order_total - 120.0).abs() < 1e-9);
    assert_eq!(payload_a.lines.len(), 1);
    assert_eq!(
        payload_a.lines[0].product_variant_id,
        format!("{hoodie}-{attribute_id}")
    );
    assert!((payload_a.lines[0].price - 60.0).abs() < 1e-9);

    let token = recovery::recovery_token(&state.config.site_secret, cart_a);
    assert_eq!(
        payload_a.checkout_url,
        recovery::checkout_url(&state.config.storefront_url, cart_a, &token)
    );

    let payload_b = payloads.iter().find(|p| p.cart_id == cart_b).unwrap();
    assert_eq!(payload_b.lines[0].product_variant_id, sticker.to_string());
    assert!((payload_b.order_total - 30.0).abs() < 1e-9);

    // Deactivating the tax drops the factor to 1.0 on the very next pass;
    // totals are computed at read time, never cached.
    let mut tax_active: TaxActive = Taxes::find_by_id(tax.id)
        .one(&state.orm)
        .await?
        .unwrap()
        .into();
    tax_active.active = Set(false);
    tax_active.update(&state.orm).await?;

    let untaxed = cart_sync::select_carts(&state, shop_id, 0, None, false).await?;
    let untaxed_a = untaxed.iter().find(|p| p.cart_id == cart_a).unwrap();
    assert!((untaxed_a.order_total - 100.0).abs() < 1e-9);

    // Mark cart A synced: it leaves the remaining set but still shows up in
    // an unfiltered selection.
    sync_state::mark_synced(&state.orm, &[cart_a]).await?;
    let remaining = cart_sync::select_carts(&state, shop_id, 0, None, true).await?;
    assert!(remaining.iter().all(|p| p.cart_id != cart_a));
    assert_eq!(sync_state::count_remaining(&state.pool, shop_id, true).await?, 2);

    let unfiltered = cart_sync::select_carts(&state, shop_id, 0, None, false).await?;
    assert!(unfiltered.iter().any(|p| p.cart_id == cart_a));

    // Marking the same batch again replaces the record rather than stacking:
    // one row per cart, stamped with the later call.
    let first_stamp = sync_stamp(&state, cart_a).await?;
    sync_state::mark_synced(&state.orm, &[cart_a]).await?;
    let records = SyncRecords::find()
        .filter(SyncCol::CartId.eq(cart_a))
        .all(&state.orm)
        .await?;
    assert_eq!(records.len(), 1);
    assert!(records[0].last_synced_at.with_timezone(&Utc) >= first_stamp);

    // A later cart modification moves the watermark behind the cart again.
    let mut cart_active: CartActive = Carts::find_by_id(cart_a)
        .one(&state.orm)
        .await?
        .unwrap()
        .into();
    cart_active.updated_at = Set(Utc::now().into());
    cart_active.update(&state.orm).await?;

    let reeligible = cart_sync::select_carts(&state, shop_id, 0, None, true).await?;
    assert!(reeligible.iter().any(|p| p.cart_id == cart_a));

    // An order against cart B removes it from every selection, regardless of
    // recency or sync state.
    OrderActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_b),
        shop_id: Set(shop_id),
        total_amount: Set(2_500),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let after_order = cart_sync::select_carts(&state, shop_id, 0, None, false).await?;
    assert!(after_order.iter().all(|p| p.cart_id != cart_b));

    // Empty batches are refused and leave the store untouched.
    let before = SyncRecords::find().all(&state.orm).await?.len();
    assert!(matches!(
        sync_state::mark_synced(&state.orm, &[]).await,
        Err(AppError::EmptyBatch)
    ));
    assert_eq!(SyncRecords::find().all(&state.orm).await?.len(), before);

    // A duplicate id inside one batch fails the whole batch atomically.
    assert!(
        sync_state::mark_synced(&state.orm, &[fresh_cart, fresh_cart])
            .await
            .is_err()
    );
    let dup_records = SyncRecords::find()
        .filter(SyncCol::CartId.eq(fresh_cart))
        .all(&state.orm)
        .await?;
    assert!(dup_records.is_empty(), "failed batch must not leave rows behind");

    // An unprovisioned shop aborts selection instead of defaulting.
    assert!(matches!(
        cart_sync::select_carts(&state, Uuid::new_v4(), 0, None, true).await,
        Err(AppError::ShopNotConfigured)
    ));

    // Bootstrap + pagination on a second shop whose marker is unset: the
    // stale filter is skipped, so even a just-synced cart is returned.
    let shop2 = Uuid::new_v4();
    ShopSettingsActive {
        id: Set(Uuid::new_v4()),
        shop_id: Set(shop2),
        tax_id: Set(None),
        carts_synced_at: Set(None),
    }
    .insert(&state.orm)
    .await?;

    let mut shop2_carts = Vec::new();
    for _ in 0..4 {
        let cart = seed_cart(&state, shop2, customer.id, Utc::now()).await?;
        seed_line(&state, cart, sticker, None, 1).await?;
        shop2_carts.push(cart);
    }
    sync_state::mark_synced(&state.orm, &[shop2_carts[0]]).await?;

    let bootstrap = cart_sync::select_carts(&state, shop2, 0, None, true).await?;
    assert_eq!(bootstrap.len(), 4, "without a shop marker nothing is filtered as stale");

    let page_one = cart_sync::select_carts(&state, shop2, 0, Some(2), true).await?;
    let page_two = cart_sync::select_carts(&state, shop2, 2, Some(2), true).await?;
    assert_eq!(page_one.len(), 2);
    assert_eq!(page_two.len(), 2);

    let mut paged: Vec<Uuid> = page_one
        .iter()
        .chain(page_two.iter())
        .map(|p| p.cart_id)
        .collect();
    let mut all: Vec<Uuid> = cart_sync::select_carts(&state, shop2, 0, Some(4), true)
        .await?
        .iter()
        .map(|p| p.cart_id)
        .collect();
    paged.sort();
    paged.dedup();
    all.sort();
    assert_eq!(paged.len(), 4, "pages must be disjoint");
    assert_eq!(paged, all);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE sync_records, cart_lines, orders, carts, shop_settings, taxes, currencies, products, customers RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        site_secret: "test-site-secret".into(),
        storefront_url: "http://shop.test".into(),
    };

    Ok(AppState { pool, orm, config })
}

async fn seed_product(state: &AppState, name: &str, price: i64) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        price: Set(price),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn seed_cart(
    state: &AppState,
    shop_id: Uuid,
    customer_id: Uuid,
    updated_at: DateTime<Utc>,
) -> anyhow::Result<Uuid> {
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        shop_id: Set(shop_id),
        customer_id: Set(customer_id),
        created_at: Set(updated_at.into()),
        updated_at: Set(updated_at.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(cart.id)
}

async fn seed_line(
    state: &AppState,
    cart_id: Uuid,
    product_id: Uuid,
    attribute_id: Option<Uuid>,
    quantity: i32,
) -> anyhow::Result<()> {
    CartLineActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_id),
        product_id: Set(product_id),
        attribute_id: Set(attribute_id),
        quantity: Set(quantity),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(())
}

async fn sync_stamp(state: &AppState, cart_id: Uuid) -> anyhow::Result<DateTime<Utc>> {
    let record = SyncRecords::find_by_id(cart_id)
        .one(&state.orm)
        .await?
        .expect("sync record");
    Ok(record.last_synced_at.with_timezone(&Utc))
}
