//! Bag label codes
//!
//! Format: `HHH-YYMMDD-SSSSSS-NN/TT`
//! - `HHH`: first three ASCII alphanumerics of the hotel name, uppercased, padded with `X`
//! - `YYMMDD`: labelling date
//! - `SSSSSS`: first six hex digits of the service id, uppercased
//! - `NN/TT`: bag number and bag count

use chrono::NaiveDate;
use uuid::Uuid;

pub fn label_code(
    hotel_name: &str,
    service_id: Uuid,
    date: NaiveDate,
    bag_number: u32,
    bag_count: u32,
) -> String {
    let mut hotel: String = hotel_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while hotel.len() < 3 {
        hotel.push('X');
    }

    let service: String = service_id
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_ascii_uppercase();

    format!(
        "{}-{}-{}-{:02}/{:02}",
        hotel,
        date.format("%y%m%d"),
        service,
        bag_number,
        bag_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_id() -> Uuid {
        Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap()
    }

    #[test]
    fn test_label_code_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let code = label_code("Hotel Miramar", service_id(), date, 2, 5);
        assert_eq!(code, "HOT-260307-A1B2C3-02/05");
    }

    #[test]
    fn test_short_and_symbolic_hotel_names_are_padded() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert_eq!(
            label_code("Ý 9", service_id(), date, 1, 1),
            "9XX-261231-A1B2C3-01/01"
        );
        assert_eq!(
            label_code("", service_id(), date, 10, 12),
            "XXX-261231-A1B2C3-10/12"
        );
    }

    #[test]
    fn test_codes_differ_per_bag() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let a = label_code("Sol", service_id(), date, 1, 2);
        let b = label_code("Sol", service_id(), date, 2, 2);
        assert_ne!(a, b);
    }
}
