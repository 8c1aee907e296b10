//! Seed the storefront with a demo furniture catalog.
//!
//! Seeding is idempotent: categories and products are upserted by name,
//! so re-running refreshes prices and stock without duplicating rows.

use std::collections::HashMap;

use furnish_core::{CategoryId, Money};
use furnish_storefront::db::products::NewProduct;
use furnish_storefront::db::{CategoryRepository, ProductRepository};

use super::{CommandError, connect};

const CATEGORIES: &[(&str, &str)] = &[
    ("Seating", "Sofas, armchairs and chairs"),
    ("Tables", "Coffee, dining and side tables"),
    ("Lighting", "Floor, table and pendant lamps"),
    ("Storage", "Shelving, cabinets and dressers"),
    ("Bedroom", "Beds, nightstands and wardrobes"),
    ("Kitchen", "Islands, stools and kitchen storage"),
];

/// One demo product. Price is in cents.
struct SeedProduct {
    name: &'static str,
    category: &'static str,
    price_cents: i64,
    style: &'static str,
    material: &'static str,
    color: &'static str,
    dimensions: &'static str,
    stock: u32,
    description: &'static str,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Modern Sofa",
        category: "Seating",
        price_cents: 89_900,
        style: "Modern",
        material: "Fabric",
        color: "Gray",
        dimensions: "84\" W x 36\" D x 32\" H",
        stock: 12,
        description: "Low-profile three seater with deep cushions.",
    },
    SeedProduct {
        name: "Scandinavian Armchair",
        category: "Seating",
        price_cents: 39_900,
        style: "Scandinavian",
        material: "Pine Wood",
        color: "Light Wood",
        dimensions: "30\" W x 32\" D x 34\" H",
        stock: 20,
        description: "Solid pine frame with a wool-blend seat.",
    },
    SeedProduct {
        name: "Industrial Bar Stools",
        category: "Kitchen",
        price_cents: 9_900,
        style: "Industrial",
        material: "Steel",
        color: "Black",
        dimensions: "16\" W x 16\" D x 30\" H",
        stock: 40,
        description: "Powder-coated steel stool with a footrest.",
    },
    SeedProduct {
        name: "Modern Coffee Table",
        category: "Tables",
        price_cents: 29_900,
        style: "Modern",
        material: "Glass",
        color: "Clear",
        dimensions: "48\" W x 24\" D x 16\" H",
        stock: 15,
        description: "Tempered glass top on a brushed metal base.",
    },
    SeedProduct {
        name: "Classic Dining Table",
        category: "Tables",
        price_cents: 79_900,
        style: "Classic",
        material: "Oak Wood",
        color: "Dark Wood",
        dimensions: "72\" W x 38\" D x 30\" H",
        stock: 6,
        description: "Seats six, turned legs and a hand-rubbed finish.",
    },
    SeedProduct {
        name: "Minimalist Desk",
        category: "Tables",
        price_cents: 34_900,
        style: "Minimalist",
        material: "Birch Plywood",
        color: "White",
        dimensions: "47\" W x 24\" D x 29\" H",
        stock: 18,
        description: "Clean lines with a hidden cable tray.",
    },
    SeedProduct {
        name: "Modern Floor Lamp",
        category: "Lighting",
        price_cents: 14_900,
        style: "Modern",
        material: "Metal",
        color: "Brass",
        dimensions: "12\" W x 12\" D x 64\" H",
        stock: 25,
        description: "Arched arm with a dimmable LED.",
    },
    SeedProduct {
        name: "Scandinavian Pendant Light",
        category: "Lighting",
        price_cents: 19_900,
        style: "Scandinavian",
        material: "Pine Wood",
        color: "Beige",
        dimensions: "18\" diameter",
        stock: 14,
        description: "Slatted wood shade for a warm glow over the table.",
    },
    SeedProduct {
        name: "Industrial Desk Lamp",
        category: "Lighting",
        price_cents: 8_900,
        style: "Industrial",
        material: "Iron",
        color: "Metal Gray",
        dimensions: "8\" W x 8\" D x 18\" H",
        stock: 30,
        description: "Adjustable arm with an exposed-bulb head.",
    },
    SeedProduct {
        name: "Modern Bookshelf",
        category: "Storage",
        price_cents: 24_900,
        style: "Modern",
        material: "Walnut Veneer",
        color: "Walnut",
        dimensions: "36\" W x 12\" D x 72\" H",
        stock: 10,
        description: "Five open shelves with a staggered back panel.",
    },
    SeedProduct {
        name: "Classic Storage Cabinet",
        category: "Storage",
        price_cents: 29_900,
        style: "Classic",
        material: "Oak Wood",
        color: "Cream",
        dimensions: "40\" W x 18\" D x 60\" H",
        stock: 8,
        description: "Paneled doors and adjustable inner shelves.",
    },
    SeedProduct {
        name: "Minimalist Bed Frame",
        category: "Bedroom",
        price_cents: 49_900,
        style: "Minimalist",
        material: "Ash Wood",
        color: "Natural",
        dimensions: "Queen, 64\" W x 84\" D x 12\" H",
        stock: 9,
        description: "Platform frame that needs no box spring.",
    },
    SeedProduct {
        name: "Scandinavian Nightstand",
        category: "Bedroom",
        price_cents: 12_900,
        style: "Scandinavian",
        material: "Pine Wood",
        color: "White",
        dimensions: "18\" W x 16\" D x 24\" H",
        stock: 22,
        description: "One drawer and an open shelf.",
    },
    SeedProduct {
        name: "Industrial Kitchen Island",
        category: "Kitchen",
        price_cents: 89_900,
        style: "Industrial",
        material: "Reclaimed Wood",
        color: "Brown",
        dimensions: "60\" W x 30\" D x 36\" H",
        stock: 4,
        description: "Butcher-block top over a steel frame with shelving.",
    },
];

impl SeedProduct {
    fn to_new_product(&self, category_id: CategoryId) -> NewProduct {
        NewProduct {
            name: self.name.to_string(),
            description: self.description.to_string(),
            price: Money::from_cents(self.price_cents),
            category_id,
            style: self.style.to_string(),
            material: self.material.to_string(),
            color: self.color.to_string(),
            dimensions: self.dimensions.to_string(),
            image_url: None,
            stock_quantity: self.stock,
        }
    }
}

/// Upsert the demo categories and products.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a statement fails.
pub async fn catalog() -> Result<(), CommandError> {
    let pool = connect().await?;

    let categories = CategoryRepository::new(&pool);
    let mut ids: HashMap<&str, CategoryId> = HashMap::new();
    for &(name, description) in CATEGORIES {
        let category = categories.upsert(name, description).await?;
        ids.insert(name, category.id);
    }
    tracing::info!(count = ids.len(), "Categories seeded");

    let products = ProductRepository::new(&pool);
    for seed in PRODUCTS {
        let category_id = ids.get(seed.category).copied().ok_or_else(|| {
            CommandError::InvalidInput(format!("unknown category {}", seed.category))
        })?;
        let id = products.upsert(&seed.to_new_product(category_id)).await?;
        tracing::debug!(product_id = %id, name = seed.name, "Product seeded");
    }
    tracing::info!(count = PRODUCTS.len(), "Products seeded");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_product_has_a_known_category() {
        for product in PRODUCTS {
            assert!(
                CATEGORIES.iter().any(|(name, _)| *name == product.category),
                "{} has unknown category {}",
                product.name,
                product.category
            );
        }
    }

    #[test]
    fn test_product_names_are_unique() {
        let mut names: Vec<_> = PRODUCTS.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PRODUCTS.len());
    }
}
