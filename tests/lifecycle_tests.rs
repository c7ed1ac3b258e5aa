//! Tests de integración del ciclo de vida de la cola de despacho:
//! el flujo completo desde que un conductor se une hasta que el viaje termina.

use rust_decimal::Decimal;

use station_management::models::queue::QueueStatus;
use station_management::services::fare::{compute_total_fare, generate_ticket_number};
use station_management::services::lifecycle::{
    can_remove, can_transition, next_position, positions_after_removal, positions_are_contiguous,
    swap_target, transition, MoveDirection, QueueAction,
};

/// Escenario completo: tres conductores se unen, el primero es llamado,
/// despacha con 4 pasajeros a ₱450 y completa el viaje.
#[test]
fn full_dispatch_flow() {
    // Tres joins consecutivos producen posiciones 1, 2, 3
    let first = next_position(None);
    let second = next_position(Some(first));
    let third = next_position(Some(second));
    assert_eq!((first, second, third), (1, 2, 3));
    assert!(positions_are_contiguous(&[first, second, third]));

    // Ciclo de vida del primero
    let status = QueueStatus::Waiting;
    let status = transition(status, QueueAction::Call).unwrap();
    assert_eq!(status, QueueStatus::Called);

    let status = transition(status, QueueAction::Depart).unwrap();
    assert_eq!(status, QueueStatus::OnTrip);

    // El ticket se emite en el despacho con el fare congelado
    let total = compute_total_fare(4, Decimal::new(450, 0));
    assert_eq!(total, Decimal::new(1800, 0));

    let status = transition(status, QueueAction::Complete).unwrap();
    assert_eq!(status, QueueStatus::Completed);
    // El despachador limpia la línea retirando la entrada terminada
    assert!(can_remove(status));
}

#[test]
fn removal_renumbers_followers() {
    // Cola de tres: al retirar la posición 2, la 3 baja a 2
    let remaining = positions_after_removal(&[1, 2, 3], 2);
    assert_eq!(remaining, vec![1, 2]);
    assert!(positions_are_contiguous(&remaining));

    // Retirar la cabeza renumera todo lo demás
    let remaining = positions_after_removal(&[1, 2, 3, 4], 1);
    assert_eq!(remaining, vec![1, 2, 3]);

    // Retirar la cola no toca a nadie
    let remaining = positions_after_removal(&[1, 2, 3], 3);
    assert_eq!(remaining, vec![1, 2]);
}

#[test]
fn delay_and_resume_preserve_position_semantics() {
    let status = transition(QueueStatus::Waiting, QueueAction::Delay).unwrap();
    assert_eq!(status, QueueStatus::Delayed);

    // Un retrasado puede volver a la espera y ser retirado, pero no salir a viaje
    assert!(can_transition(status, QueueAction::Resume));
    assert!(can_remove(status));
    assert!(!can_transition(status, QueueAction::Depart));
    assert!(!can_transition(status, QueueAction::Call));

    let status = transition(status, QueueAction::Resume).unwrap();
    assert_eq!(status, QueueStatus::Waiting);
}

#[test]
fn completed_is_terminal() {
    for action in [
        QueueAction::Call,
        QueueAction::Depart,
        QueueAction::Complete,
        QueueAction::Delay,
        QueueAction::Resume,
    ] {
        assert!(
            transition(QueueStatus::Completed, action).is_err(),
            "completed must reject {:?}",
            action
        );
    }
}

/// Una entrada completada sigue ocupando su posición hasta que el
/// despachador la retira; al retirarla, los de atrás avanzan.
#[test]
fn completed_entries_can_be_cleared_from_the_line() {
    assert!(can_remove(QueueStatus::Completed));

    // Cabeza de línea completada con dos esperando detrás
    let remaining = positions_after_removal(&[1, 2, 3], 1);
    assert_eq!(remaining, vec![1, 2]);
    assert!(positions_are_contiguous(&remaining));
}

#[test]
fn illegal_shortcuts_are_rejected() {
    // No se puede despachar sin haber sido llamado
    assert!(transition(QueueStatus::Waiting, QueueAction::Depart).is_err());
    // No se puede completar sin estar en viaje
    assert!(transition(QueueStatus::Called, QueueAction::Complete).is_err());
    // Un llamado ya no puede retrasarse
    assert!(transition(QueueStatus::Called, QueueAction::Delay).is_err());
    // Resume solo aplica a retrasados
    assert!(transition(QueueStatus::Waiting, QueueAction::Resume).is_err());
}

#[test]
fn swap_targets_respect_queue_bounds() {
    // La cabeza no puede subir, la cola no puede bajar
    assert_eq!(swap_target(1, MoveDirection::Up, 3), None);
    assert_eq!(swap_target(3, MoveDirection::Down, 3), None);

    // Intercambios internos
    assert_eq!(swap_target(2, MoveDirection::Up, 3), Some(1));
    assert_eq!(swap_target(2, MoveDirection::Down, 3), Some(3));

    // Cola de uno: ningún movimiento posible
    assert_eq!(swap_target(1, MoveDirection::Up, 1), None);
    assert_eq!(swap_target(1, MoveDirection::Down, 1), None);
}

#[test]
fn contiguity_detects_gaps_and_duplicates() {
    assert!(positions_are_contiguous(&[]));
    assert!(positions_are_contiguous(&[1]));
    assert!(positions_are_contiguous(&[2, 1, 3]));
    assert!(!positions_are_contiguous(&[1, 3]));
    assert!(!positions_are_contiguous(&[0, 1, 2]));
    assert!(!positions_are_contiguous(&[1, 2, 2]));
}

#[test]
fn repeated_removals_keep_contiguity() {
    let mut positions: Vec<i32> = (1..=6).collect();
    for removed in [4, 1, 3] {
        positions = positions_after_removal(&positions, removed);
        assert!(
            positions_are_contiguous(&positions),
            "gap after removing {}: {:?}",
            removed,
            positions
        );
    }
    assert_eq!(positions, vec![1, 2, 3]);
}

#[test]
fn fare_snapshot_math() {
    // Decimales exactos, sin flotantes
    assert_eq!(
        compute_total_fare(3, Decimal::new(1250, 2)),
        Decimal::new(3750, 2)
    );
    assert_eq!(compute_total_fare(1, Decimal::ZERO), Decimal::ZERO);
}

#[test]
fn ticket_numbers_have_expected_shape() {
    let number = generate_ticket_number();
    assert!(number.starts_with("TKT-"));
    assert_eq!(number.len(), 16);
    assert!(number[4..].chars().all(|c| c.is_ascii_alphanumeric()));

    // Dos emisiones consecutivas no colisionan
    assert_ne!(generate_ticket_number(), generate_ticket_number());
}
