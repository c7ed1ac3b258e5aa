//! Cálculo de tarifas y numeración de tickets
//!
//! La tarifa total de un ticket se congela al momento de emisión:
//! `passenger_count × price_per_passenger` con el precio vigente de la
//! ruta en ese instante. Cambios posteriores de precio no afectan
//! tickets ya emitidos.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Tarifa total congelada al emitir el ticket
pub fn compute_total_fare(passenger_count: i32, fare_per_passenger: Decimal) -> Decimal {
    Decimal::from(passenger_count) * fare_per_passenger
}

/// Número de ticket legible para impresión (TKT-XXXXXXXXXXXX).
/// 12 hex dan 2^48 combinaciones: la columna UNIQUE no colisiona a
/// volúmenes de terminal.
pub fn generate_ticket_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("TKT-{}", id[..12].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_total_fare() {
        // 4 pasajeros a ₱450 = ₱1800
        assert_eq!(compute_total_fare(4, Decimal::from(450)), Decimal::from(1800));
        assert_eq!(compute_total_fare(1, Decimal::from(200)), Decimal::from(200));
        assert_eq!(compute_total_fare(0, Decimal::from(450)), Decimal::ZERO);
    }

    #[test]
    fn test_compute_total_fare_with_cents() {
        let fare: Decimal = "12.50".parse().unwrap();
        let expected: Decimal = "37.50".parse().unwrap();
        assert_eq!(compute_total_fare(3, fare), expected);
    }

    #[test]
    fn test_ticket_number_format() {
        let number = generate_ticket_number();
        assert!(number.starts_with("TKT-"));
        assert_eq!(number.len(), 16);
        assert!(number[4..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_ticket_numbers_are_distinct() {
        let a = generate_ticket_number();
        let b = generate_ticket_number();
        assert_ne!(a, b);
    }
}
