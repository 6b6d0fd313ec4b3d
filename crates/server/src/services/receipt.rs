//! PDF receipt generation.
//!
//! Renders a minimal A4 receipt for an order and stores it under the
//! configured receipt directory. Layout is intentionally plain: shop header,
//! order metadata, one line per item, totals.

use std::path::Path;

use thiserror::Error;

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::models::Order;

/// Errors that can occur while generating a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("pdf error: {0}")]
    Pdf(#[from] printpdf::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// PDF receipt generator.
pub struct ReceiptService<'a> {
    shop_name: &'a str,
    receipt_dir: &'a Path,
}

impl<'a> ReceiptService<'a> {
    /// Create a new receipt service.
    #[must_use]
    pub const fn new(shop_name: &'a str, receipt_dir: &'a Path) -> Self {
        Self {
            shop_name,
            receipt_dir,
        }
    }

    /// Generate a receipt PDF for an order and write it to disk.
    ///
    /// Returns the relative URL under which the file is served.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError` if rendering or writing fails.
    pub fn generate(&self, order: &Order) -> Result<String, ReceiptError> {
        let bytes = self.render(order)?;

        let file_name = format!("order-{}.pdf", order.id);
        std::fs::write(self.receipt_dir.join(&file_name), bytes)?;

        Ok(format!("/receipts/{file_name}"))
    }

    /// Render the receipt into PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::Pdf` if the document cannot be built.
    pub fn render(&self, order: &Order) -> Result<Vec<u8>, ReceiptError> {
        let title = format!("{} - Receipt #{}", self.shop_name, order.id);
        let (doc, page, layer) = PdfDocument::new(&title, Mm(210.0), Mm(297.0), "receipt");

        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);

        let left = Mm(20.0);
        let mut y = 272.0;

        layer.use_text(self.shop_name, 18.0, left, Mm(y), &bold);
        y -= 10.0;
        layer.use_text(format!("Receipt for order #{}", order.id), 12.0, left, Mm(y), &font);
        y -= 6.0;
        layer.use_text(
            format!("Date: {}", order.created_at.format("%Y-%m-%d %H:%M UTC")),
            10.0,
            left,
            Mm(y),
            &font,
        );
        y -= 6.0;
        layer.use_text(format!("Customer: {}", order.full_name), 10.0, left, Mm(y), &font);
        y -= 6.0;
        layer.use_text(format!("Address: {}", order.address), 10.0, left, Mm(y), &font);
        y -= 6.0;
        layer.use_text(
            format!(
                "Payment: {} ({})",
                order.payment_method, order.payment_status
            ),
            10.0,
            left,
            Mm(y),
            &font,
        );

        y -= 12.0;
        layer.use_text("Items", 12.0, left, Mm(y), &bold);
        y -= 7.0;
        for item in &order.items {
            layer.use_text(
                format!(
                    "{} x{} @ {} = {}",
                    item.name,
                    item.quantity,
                    item.price,
                    item.subtotal()
                ),
                10.0,
                left,
                Mm(y),
                &font,
            );
            y -= 6.0;
        }

        y -= 6.0;
        layer.use_text(format!("Subtotal: {}", order.items_total), 10.0, left, Mm(y), &font);
        y -= 6.0;
        if order.discount > rust_decimal::Decimal::ZERO {
            let code = order.promo_code.as_deref().unwrap_or("-");
            layer.use_text(
                format!("Discount ({code}): -{}", order.discount),
                10.0,
                left,
                Mm(y),
                &font,
            );
            y -= 6.0;
        }
        layer.use_text(format!("Delivery: {}", order.delivery_amount), 10.0, left, Mm(y), &font);
        y -= 8.0;
        layer.use_text(format!("Total: {}", order.total_amount), 14.0, left, Mm(y), &bold);

        Ok(doc.save_to_bytes()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::dec;
    use verdant_core::{
        OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
    };

    use crate::models::OrderItem;

    fn sample_order() -> Order {
        Order {
            id: OrderId::new(7),
            user_id: UserId::new(1),
            items: vec![OrderItem {
                product_id: ProductId::new(1),
                name: "Monstera deliciosa".to_owned(),
                price: dec!(500),
                quantity: 2,
            }],
            items_total: dec!(1000),
            discount: dec!(100),
            delivery_amount: dec!(200),
            total_amount: dec!(1100),
            full_name: "Fern Fan".to_owned(),
            address: "1 Greenhouse Lane".to_owned(),
            phone: "+1000000".to_owned(),
            delivery_type: "courier".to_owned(),
            payment_method: PaymentMethod::BankTransfer,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            promo_code: Some("TEN".to_owned()),
            payment_proof: None,
            tracking_number: None,
            delivery_date: None,
            comment: None,
            quantities_reduced: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let service = ReceiptService::new("Verdant Plant Shop", Path::new("receipts"));
        let bytes = service.render(&sample_order()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
