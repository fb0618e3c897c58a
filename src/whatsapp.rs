//! Checkout hand-off: a `wa.me` deep link carrying the order summary.

use std::fmt::Write;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{models::Order, pricing::format_yen};

/// RFC 3986 unreserved characters stay literal, everything else is escaped.
const TEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn link(number: &str, text: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    format!(
        "https://wa.me/{}?text={}",
        digits,
        utf8_percent_encode(text, TEXT_ENCODE_SET)
    )
}

pub fn short_order_id(order: &Order) -> String {
    order.id.simple().to_string()[..8].to_ascii_uppercase()
}

pub fn order_message(order: &Order) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "*Pesanan Baru* #{}", short_order_id(order));
    let _ = writeln!(text);
    for (i, line) in order.items.iter().enumerate() {
        let name = match &line.variant_name {
            Some(variant) => format!("{} ({})", line.name, variant),
            None => line.name.clone(),
        };
        let _ = writeln!(
            text,
            "{}. {} x{} = {}",
            i + 1,
            name,
            line.quantity,
            format_yen(line.subtotal)
        );
    }
    let _ = writeln!(text);
    let _ = writeln!(text, "*Total: {}*", format_yen(order.total_price));
    let _ = writeln!(text);
    let customer = &order.customer_info;
    let _ = writeln!(text, "Nama: {}", customer.name);
    let _ = writeln!(text, "Telepon: {}", customer.phone);
    let _ = writeln!(text, "Alamat: {}", customer.address);
    if let Some(notes) = customer.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(text, "Catatan: {notes}");
    }
    if let Some(code) = &order.referral_code {
        let _ = writeln!(text, "Kode referral: {code}");
    }
    text.trim_end().to_string()
}

pub fn order_link(number: &str, order: &Order) -> String {
    link(number, &order_message(order))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::{CustomerInfo, OrderLine, OrderStatus};

    fn sample_order() -> Order {
        Order {
            id: Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap(),
            user_id: None,
            customer_info: CustomerInfo {
                name: "Siti".into(),
                phone: "090-1234-5678".into(),
                address: "Tokyo, Shinjuku 1-2-3".into(),
                notes: Some("Tolong antar sore".into()),
            },
            items: vec![
                OrderLine {
                    product_id: Uuid::from_u128(1),
                    variant_id: None,
                    name: "Indomie Goreng".into(),
                    variant_name: None,
                    image_url: None,
                    unit_price: 150,
                    quantity: 10,
                    subtotal: 1_500,
                },
                OrderLine {
                    product_id: Uuid::from_u128(2),
                    variant_id: Some(Uuid::from_u128(3)),
                    name: "Sambal ABC".into(),
                    variant_name: Some("Extra Pedas".into()),
                    image_url: None,
                    unit_price: 480,
                    quantity: 1,
                    subtotal: 480,
                },
            ],
            total_price: 1_980,
            status: OrderStatus::Pending,
            referral_code: Some("AB12CD34".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn message_lists_lines_total_and_customer() {
        let text = order_message(&sample_order());
        assert!(text.starts_with("*Pesanan Baru* #A1B2C3D4"));
        assert!(text.contains("1. Indomie Goreng x10 = ¥1,500"));
        assert!(text.contains("2. Sambal ABC (Extra Pedas) x1 = ¥480"));
        assert!(text.contains("*Total: ¥1,980*"));
        assert!(text.contains("Alamat: Tokyo, Shinjuku 1-2-3"));
        assert!(text.contains("Kode referral: AB12CD34"));
    }

    #[test]
    fn link_strips_number_and_encodes_text() {
        let url = link("+81 90-0000-1111", "Halo & ¥100\nok");
        assert_eq!(
            url,
            "https://wa.me/819000001111?text=Halo%20%26%20%C2%A5100%0Aok"
        );
    }
}
