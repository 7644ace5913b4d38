//! Integration tests for carts turning into orders.
//!
//! These tests exercise the public domain API only: pricing a cart, editing
//! it, and placing an order from it.

use common::UserId;
use domain::{Cart, CartItem, Category, Money, Order, OrderStatus, Product, Quantity};

fn qty(n: i64) -> Quantity {
    Quantity::new(n).unwrap()
}

fn catalog() -> (Product, Product) {
    let tools = Category::new("Tools");
    let hammer = Product::new("Hammer", Money::from_cents(500)).in_category(tools.clone());
    let saw = Product::new("Saw", Money::from_cents(300)).in_category(tools);
    (hammer, saw)
}

mod cart_lifecycle {
    use super::*;

    #[test]
    fn edit_cart_then_checkout() {
        let (hammer, saw) = catalog();

        let mut cart = Cart::new(vec![CartItem::new(Some(hammer.clone()), qty(1))]).unwrap();
        assert_eq!(cart.total_amount().to_string(), "5.00");

        cart.replace_items(vec![
            CartItem::new(Some(hammer.clone()), qty(2)),
            CartItem::new(Some(saw.clone()), qty(1)),
        ])
        .unwrap();
        assert_eq!(cart.total_amount().to_string(), "13.00");

        let owner = UserId::new();
        let order = Order::from_cart(&cart, owner).unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total_amount().to_string(), "13.00");
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.items()[0].unit_price, Money::from_cents(500));
        assert_eq!(order.items()[1].unit_price, Money::from_cents(300));
    }

    #[test]
    fn discount_applies_through_checkout() {
        let product =
            Product::new("Widget", Money::from_cents(1000)).with_discount(Money::from_cents(850));
        let cart = Cart::new(vec![CartItem::new(Some(product), qty(3))]).unwrap();

        let order = Order::from_cart(&cart, UserId::new()).unwrap();

        assert_eq!(cart.total_amount().to_string(), "25.50");
        assert_eq!(order.total_amount().to_string(), "25.50");
    }

    #[test]
    fn repeated_product_lines_are_not_merged() {
        let (hammer, _) = catalog();
        let cart = Cart::new(vec![
            CartItem::new(Some(hammer.clone()), qty(1)),
            CartItem::new(Some(hammer), qty(1)),
        ])
        .unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total_amount(), Money::from_cents(1000));
    }
}

mod order_lifecycle {
    use super::*;

    #[test]
    fn status_can_move_both_ways() {
        let (hammer, _) = catalog();
        let cart = Cart::new(vec![CartItem::new(Some(hammer), qty(1))]).unwrap();
        let mut order = Order::from_cart(&cart, UserId::new()).unwrap();

        order.set_status(OrderStatus::Completed);
        assert_eq!(order.status(), OrderStatus::Completed);

        order.set_status(OrderStatus::Pending);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total_amount(), Money::from_cents(500));
    }

    #[test]
    fn removed_product_keeps_snapshotted_price() {
        let (hammer, _) = catalog();
        let cart = Cart::new(vec![CartItem::new(Some(hammer), qty(2))]).unwrap();
        let order = Order::from_cart(&cart, UserId::new()).unwrap();

        let restored = Order::restore(
            order.id(),
            order.user_id(),
            order
                .items()
                .iter()
                .map(|item| domain::OrderItem::new(None, item.quantity, item.unit_price))
                .collect(),
            order.total_amount(),
            order.status(),
            order.created_at(),
            order.updated_at(),
        );

        assert_eq!(restored.items()[0].product_id(), None);
        assert_eq!(restored.items()[0].unit_price, Money::from_cents(500));
        assert_eq!(restored.total_amount(), Money::from_cents(1000));
    }
}
