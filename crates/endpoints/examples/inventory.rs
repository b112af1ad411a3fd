//! A small inventory service described once and used from both sides.
//!
//! The router is served in-process through `LocalTransport`, so the example runs without
//! opening any socket:
//!
//! ```text
//! cargo run --example inventory
//! ```

use http::StatusCode;
use micro_endpoints::client::{Client, LocalTransport};
use micro_endpoints::codec::{Json, OrNotFound, WithStatus, json, or_not_found, with_status};
use micro_endpoints::combine::{Tupled, UnitLeft};
use micro_endpoints::header::{BasicAuth, Credentials, basic_auth};
use micro_endpoints::request::{Request, get, post};
use micro_endpoints::url::{Fixed, Params, Segment, WithQuery};
use micro_endpoints::{Endpoint, Router, endpoint, url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Item {
    name: String,
    count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Page {
    offset: usize,
    limit: usize,
}

mod api {
    use super::*;

    pub type FindItem = Endpoint<Request<Segment<u64>>, OrNotFound<Json<Item>>>;
    pub type ListItems = Endpoint<Request<WithQuery<Fixed, Params<Page>, UnitLeft>>, Json<Vec<Item>>>;
    pub type CreateItem = Endpoint<Request<Fixed, Json<Item>, BasicAuth, UnitLeft, Tupled>, WithStatus<Json<u64>>>;

    // GET /items/{id}
    pub fn find_item() -> FindItem {
        endpoint(get(url::segment("/items/{id}").unwrap()), or_not_found(json()))
    }

    // GET /items?offset=..&limit=..
    pub fn list_items() -> ListItems {
        endpoint(get(url::fixed("/items").unwrap().with_query(url::params(), UnitLeft)), json())
    }

    // POST /items with basic auth, answers 201 with the new id
    pub fn create_item() -> CreateItem {
        endpoint(
            post(url::fixed("/items").unwrap())
                .with_body(json(), UnitLeft)
                .with_headers(basic_auth("inventory"), Tupled),
            with_status(StatusCode::CREATED, json()),
        )
    }
}

#[derive(Default)]
struct Store {
    items: RwLock<HashMap<u64, Item>>,
}

impl Store {
    fn find(&self, id: u64) -> Option<Item> {
        self.items.read().ok()?.get(&id).cloned()
    }

    fn list(&self, page: Page) -> Vec<Item> {
        let Ok(items) = self.items.read() else { return vec![] };
        let mut ids = items.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids.into_iter().skip(page.offset).take(page.limit).filter_map(|id| items.get(&id).cloned()).collect()
    }

    fn insert(&self, item: Item) -> u64 {
        let Ok(mut items) = self.items.write() else { return 0 };
        let id = items.len() as u64 + 1;
        items.insert(id, item);
        id
    }
}

fn router(store: Arc<Store>) -> Router {
    let (find, list, create) = (store.clone(), store.clone(), store);
    Router::builder()
        .route(api::find_item(), move |id: u64| {
            let store = find.clone();
            async move { store.find(id) }
        })
        .route(api::list_items(), move |page: Page| {
            let store = list.clone();
            async move { store.list(page) }
        })
        .route(api::create_item(), move |(item, credentials): (Item, Credentials)| {
            let store = create.clone();
            async move {
                info!(user = %credentials.username, name = %item.name, "creating item");
                store.insert(item)
            }
        })
        .build()
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = router(Arc::new(Store::default()));
    info!(routes = router.len(), "router built");
    let client = Client::new("", LocalTransport::new(router));

    for (name, count) in [("pen", 3), ("ink", 12)] {
        let item = Item { name: name.to_string(), count };
        match client.issue(&api::create_item(), (item, Credentials::new("admin", "secret"))).await {
            Ok(Ok(id)) => info!(id, "item created"),
            Ok(Err(e)) => error!(cause = %e, "unexpected response"),
            Err(e) => error!(cause = %e, "request failed"),
        }
    }

    info!(url = %api::find_item().url_for(2).unwrap(), "reverse routing");
    match client.issue(&api::find_item(), 2).await {
        Ok(Ok(item)) => info!(?item, "found"),
        other => error!(?other, "lookup failed"),
    }

    match client.issue(&api::list_items(), Page { offset: 0, limit: 10 }).await {
        Ok(Ok(items)) => info!(?items, "listed"),
        other => error!(?other, "listing failed"),
    }
}
