//! Catalog management: categories and products.

use common::{CategoryId, Page, PageRequest, ProductId};
use domain::{Category, Money, Product};
use serde::Deserialize;
use store::{CatalogStore, ProductQuery};

use crate::error::{Result, ShopError};
use crate::validation::ValidationErrors;

/// Category fields as submitted by a client.
///
/// Creation requires `name`; an update changes only the fields present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: Option<String>,
    pub visible: Option<bool>,
    #[serde(rename = "sortID", alias = "sortId")]
    pub sort_id: Option<i32>,
    pub image_url: Option<String>,
}

impl CategoryInput {
    fn check(&self, errors: &mut ValidationErrors) {
        if let Some(ref name) = self.name {
            errors.non_empty("name", name);
        }
        if let Some(ref url) = self.image_url {
            errors.url("imageUrl", url);
        }
    }

    fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(visible) = self.visible {
            category.visible = visible;
        }
        if let Some(sort_id) = self.sort_id {
            category.sort_id = sort_id;
        }
        if let Some(image_url) = self.image_url {
            category.image_url = Some(image_url);
        }
    }
}

/// Product fields as submitted by a client.
///
/// Creation requires `name` and `price`; an update changes only the fields
/// present. An empty `categoryid` removes the category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub discounted_price: Option<Money>,
    pub description: Option<String>,
    #[serde(rename = "categoryid", alias = "categoryId")]
    pub category_id: Option<String>,
    #[serde(rename = "sortID", alias = "sortId")]
    pub sort_id: Option<i32>,
    pub visible: Option<bool>,
    pub is_in_stock: Option<bool>,
    pub image_url: Option<String>,
}

/// A validated product input with its category reference parsed.
struct CheckedProduct {
    input: ProductInput,
    /// `Some(None)` clears the category.
    category: Option<Option<CategoryId>>,
}

impl ProductInput {
    fn check(mut self, errors: &mut ValidationErrors) -> CheckedProduct {
        if let Some(ref name) = self.name {
            errors.non_empty("name", name);
        }
        self.price = self.price.map(|p| errors.positive_money("price", p));
        self.discounted_price = self
            .discounted_price
            .map(|p| errors.positive_money("discountedPrice", p));
        if let Some(ref url) = self.image_url {
            errors.url("imageUrl", url);
        }
        let category = self.category_id.as_deref().map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                None
            } else {
                errors.id::<CategoryId>("categoryid", raw)
            }
        });
        CheckedProduct {
            input: self,
            category,
        }
    }
}

/// Service for the product catalog.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_category(&self, input: CategoryInput) -> Result<Category> {
        let mut errors = ValidationErrors::new();
        let name = errors.required("name", input.name.clone()).unwrap_or_default();
        input.check(&mut errors);
        errors.finish(())?;

        let mut category = Category::new(name);
        input.apply(&mut category);
        self.store.insert_category(&category).await?;

        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_category(&self, id: CategoryId, input: CategoryInput) -> Result<Category> {
        let mut errors = ValidationErrors::new();
        input.check(&mut errors);
        errors.finish(())?;

        let mut category = self.find_category(id).await?;
        input.apply(&mut category);
        if !self.store.update_category(&category).await? {
            return Err(ShopError::not_found("Category"));
        }
        Ok(category)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        if !self.store.delete_category(id).await? {
            return Err(ShopError::not_found("Category"));
        }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }

    /// Every category, ordered by sort key.
    #[tracing::instrument(skip(self))]
    pub async fn all_categories(&self) -> Result<Vec<Category>> {
        Ok(self.store.all_categories().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self, page: PageRequest) -> Result<Page<Category>> {
        Ok(self.store.list_categories(page).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_product(&self, input: ProductInput) -> Result<Product> {
        let mut errors = ValidationErrors::new();
        let name = errors.required("name", input.name.clone()).unwrap_or_default();
        let price = errors.required("price", input.price).unwrap_or_default();
        let checked = input.check(&mut errors);
        errors.finish(())?;

        let mut product = Product::new(name, price.rounded());
        self.apply_product(checked, &mut product).await?;
        self.store.insert_product(&product).await?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_product(&self, id: ProductId, input: ProductInput) -> Result<Product> {
        let mut errors = ValidationErrors::new();
        let checked = input.check(&mut errors);
        errors.finish(())?;

        let mut product = self.get_product(id).await?;
        self.apply_product(checked, &mut product).await?;
        if !self.store.update_product(&product).await? {
            return Err(ShopError::not_found("Product"));
        }
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(ShopError::not_found("Product"));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.store
            .find_product(id)
            .await?
            .ok_or_else(|| ShopError::not_found("Product"))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, page: PageRequest) -> Result<Page<Product>> {
        Ok(self.store.list_products(&ProductQuery::new(), page).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products_by_category(
        &self,
        category: CategoryId,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let query = ProductQuery::in_category(category);
        Ok(self.store.list_products(&query, page).await?)
    }

    /// Case-insensitive substring search over name and description.
    ///
    /// An empty term matches every product.
    #[tracing::instrument(skip(self))]
    pub async fn search_products(&self, term: &str, page: PageRequest) -> Result<Page<Product>> {
        let query = ProductQuery::search(term);
        Ok(self.store.list_products(&query, page).await?)
    }

    async fn find_category(&self, id: CategoryId) -> Result<Category> {
        self.store
            .find_category(id)
            .await?
            .ok_or_else(|| ShopError::not_found("Category"))
    }

    /// Copies the present fields onto `product`.
    ///
    /// A category ID that does not resolve leaves the product without one.
    async fn apply_product(&self, checked: CheckedProduct, product: &mut Product) -> Result<()> {
        let CheckedProduct { input, category } = checked;

        if let Some(category) = category {
            product.category = match category {
                Some(id) => self.store.find_category(id).await?,
                None => None,
            };
        }
        if let Some(name) = input.name {
            product.name = name;
        }
        if let Some(price) = input.price {
            product.price = price;
        }
        if let Some(discounted_price) = input.discounted_price {
            product.discounted_price = Some(discounted_price);
        }
        if let Some(description) = input.description {
            product.description = Some(description);
        }
        if let Some(sort_id) = input.sort_id {
            product.sort_id = sort_id;
        }
        if let Some(visible) = input.visible {
            product.visible = visible;
        }
        if let Some(is_in_stock) = input.is_in_stock {
            product.is_in_stock = is_in_stock;
        }
        if let Some(image_url) = input.image_url {
            product.image_url = Some(image_url);
        }
        Ok(())
    }
}
