use std::collections::HashMap;
use std::path::Path;

use config_file::FromConfigFile;
use serde::Deserialize;

use crate::config::ConfigError;

pub const ITEM_CHANNEL: &str = "item";
pub const ORDER_CHANNEL: &str = "order";

pub trait Resolver {
    fn resolve(&self, token: &str) -> Resolution;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Item(Vec<usize>),
    Order(Vec<usize>),
    Unresolved,
}

impl Resolution {
    pub fn channel(&self) -> Option<&'static str> {
        match self {
            Resolution::Item(_) => Some(ITEM_CHANNEL),
            Resolution::Order(_) => Some(ORDER_CHANNEL),
            Resolution::Unresolved => None,
        }
    }

    pub fn addresses(&self) -> &[usize] {
        match self {
            Resolution::Item(addresses) | Resolution::Order(addresses) => addresses,
            Resolution::Unresolved => &[],
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub items: HashMap<String, Vec<usize>>,
    pub orders: HashMap<String, Vec<String>>,
}

impl Inventory {
    pub fn load(path: &Path) -> Result<Inventory, ConfigError> {
        let inventory =
            Inventory::from_config_file(path).map_err(|source| ConfigError::Load {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!(
            "Loaded {} items and {} orders from {}",
            inventory.items.len(),
            inventory.orders.len(),
            path.display()
        );
        Ok(inventory)
    }
}

pub struct InventoryResolver {
    inventory: Inventory,
}

impl InventoryResolver {
    pub fn new(inventory: Inventory) -> InventoryResolver {
        InventoryResolver { inventory }
    }

    fn expand_order(&self, order: &str, skus: &[String]) -> Vec<usize> {
        let mut addresses = Vec::new();
        for sku in skus {
            match self.inventory.items.get(sku) {
                Some(bins) => {
                    for bin in bins {
                        if !addresses.contains(bin) {
                            addresses.push(*bin);
                        }
                    }
                }
                None => log::warn!("Order {order} lists unknown item {sku}"),
            }
        }
        addresses
    }
}

impl Resolver for InventoryResolver {
    fn resolve(&self, token: &str) -> Resolution {
        let token = token.trim();

        if let Some(bins) = self.inventory.items.get(token) {
            return Resolution::Item(bins.clone());
        }

        if let Some(skus) = self.inventory.orders.get(token) {
            let addresses = self.expand_order(token, skus);
            if !addresses.is_empty() {
                return Resolution::Order(addresses);
            }
        }

        Resolution::Unresolved
    }
}
