//! Ciclo de vida de la cola de despacho
//!
//! Máquina de estados explícita para las entradas de cola:
//!
//! ```text
//! Waiting --call-->    Called
//! Called  --depart-->  OnTrip      (aquí se emite el TripTicket)
//! OnTrip  --complete-> Completed   (terminal)
//! Waiting --delay-->   Delayed
//! Delayed --resume-->  Waiting
//! (any)   --remove-->  eliminada   (renumera a los que quedan detrás)
//! ```
//!
//! La legalidad de una transición se comprueba con una función pura antes
//! de tocar la base de datos, de modo que una acción sobre un estado previo
//! incorrecto falla con `InvalidTransition` sin mutar nada. Los helpers de
//! posición replican exactamente lo que hacen los UPDATEs transaccionales
//! y mantienen el invariante: las posiciones de una ruta siempre son
//! {1..N}, sin huecos ni duplicados.

use crate::models::queue::QueueStatus;
use crate::utils::errors::{invalid_transition_error, AppError};

/// Acción de despacho sobre una entrada de cola
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    /// El despachador llama al vehículo
    Call,
    /// El conductor sale a ruta (emite ticket)
    Depart,
    /// El viaje termina
    Complete,
    /// Se detecta un retraso
    Delay,
    /// El retraso se resuelve
    Resume,
}

impl QueueAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueAction::Call => "call",
            QueueAction::Depart => "depart",
            QueueAction::Complete => "complete",
            QueueAction::Delay => "delay",
            QueueAction::Resume => "resume",
        }
    }
}

/// Dirección de reordenamiento manual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Aplicar una acción a un estado, devolviendo el estado resultante.
/// Toda combinación no listada es ilegal y no debe mutar nada.
pub fn transition(current: QueueStatus, action: QueueAction) -> Result<QueueStatus, AppError> {
    match (current, action) {
        (QueueStatus::Waiting, QueueAction::Call) => Ok(QueueStatus::Called),
        (QueueStatus::Called, QueueAction::Depart) => Ok(QueueStatus::OnTrip),
        (QueueStatus::OnTrip, QueueAction::Complete) => Ok(QueueStatus::Completed),
        (QueueStatus::Waiting, QueueAction::Delay) => Ok(QueueStatus::Delayed),
        (QueueStatus::Delayed, QueueAction::Resume) => Ok(QueueStatus::Waiting),
        (current, action) => Err(invalid_transition_error(current.as_str(), action.as_str())),
    }
}

/// Comprobación previa sin construir el error (feedback fail-fast en cliente)
pub fn can_transition(current: QueueStatus, action: QueueAction) -> bool {
    transition(current, action).is_ok()
}

/// El despachador puede retirar una entrada desde cualquier estado,
/// incluso `Completed`: retirar no es una transición sino limpiar la
/// línea, y los que quedan detrás se renumeran.
pub fn can_remove(_current: QueueStatus) -> bool {
    true
}

/// Posición asignada a una entrada nueva: max(posiciones existentes) + 1
pub fn next_position(max_existing: Option<i32>) -> i32 {
    max_existing.unwrap_or(0) + 1
}

/// Posiciones resultantes tras eliminar la entrada en `removed`:
/// todo lo que estaba detrás retrocede uno. Espejo del UPDATE
/// `SET position = position - 1 WHERE position > $removed`.
pub fn positions_after_removal(positions: &[i32], removed: i32) -> Vec<i32> {
    positions
        .iter()
        .filter(|&&p| p != removed)
        .map(|&p| if p > removed { p - 1 } else { p })
        .collect()
}

/// Posición vecina con la que intercambiar en un move-up/move-down.
/// Devuelve `None` en los bordes (primera entrada hacia arriba, última
/// hacia abajo); en ese caso la operación es un no-op rechazable.
pub fn swap_target(position: i32, direction: MoveDirection, queue_len: i32) -> Option<i32> {
    match direction {
        MoveDirection::Up if position > 1 => Some(position - 1),
        MoveDirection::Down if position < queue_len => Some(position + 1),
        _ => None,
    }
}

/// Verificar el invariante de posiciones: el conjunto es exactamente {1..N}
pub fn positions_are_contiguous(positions: &[i32]) -> bool {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, &p)| p == i as i32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert_eq!(transition(QueueStatus::Waiting, QueueAction::Call).unwrap(), QueueStatus::Called);
        assert_eq!(transition(QueueStatus::Called, QueueAction::Depart).unwrap(), QueueStatus::OnTrip);
        assert_eq!(transition(QueueStatus::OnTrip, QueueAction::Complete).unwrap(), QueueStatus::Completed);
        assert_eq!(transition(QueueStatus::Waiting, QueueAction::Delay).unwrap(), QueueStatus::Delayed);
        assert_eq!(transition(QueueStatus::Delayed, QueueAction::Resume).unwrap(), QueueStatus::Waiting);
    }

    #[test]
    fn test_completed_is_terminal_for_every_action() {
        for action in [
            QueueAction::Call,
            QueueAction::Depart,
            QueueAction::Complete,
            QueueAction::Delay,
            QueueAction::Resume,
        ] {
            assert!(transition(QueueStatus::Completed, action).is_err());
        }
    }

    #[test]
    fn test_removal_is_allowed_from_every_state() {
        for status in [
            QueueStatus::Waiting,
            QueueStatus::Called,
            QueueStatus::OnTrip,
            QueueStatus::Delayed,
            QueueStatus::Completed,
        ] {
            assert!(can_remove(status), "no se pudo retirar desde {}", status.as_str());
        }
    }

    #[test]
    fn test_illegal_transition_table() {
        // No se puede despachar sin haber llamado
        assert!(transition(QueueStatus::Waiting, QueueAction::Depart).is_err());
        // No se puede completar sin estar en viaje
        assert!(transition(QueueStatus::Waiting, QueueAction::Complete).is_err());
        assert!(transition(QueueStatus::Called, QueueAction::Complete).is_err());
        // Un vehículo llamado ya no puede retrasarse ni volver a llamarse
        assert!(transition(QueueStatus::Called, QueueAction::Call).is_err());
        assert!(transition(QueueStatus::Called, QueueAction::Delay).is_err());
        // Resume solo aplica a Delayed
        assert!(transition(QueueStatus::Waiting, QueueAction::Resume).is_err());
        assert!(transition(QueueStatus::Delayed, QueueAction::Depart).is_err());
        assert!(transition(QueueStatus::Delayed, QueueAction::Call).is_err());
    }

    #[test]
    fn test_can_transition_matches_transition() {
        assert!(can_transition(QueueStatus::Waiting, QueueAction::Call));
        assert!(!can_transition(QueueStatus::OnTrip, QueueAction::Call));
    }

    #[test]
    fn test_next_position() {
        assert_eq!(next_position(None), 1);
        assert_eq!(next_position(Some(3)), 4);
    }

    #[test]
    fn test_positions_after_removal_middle() {
        // Escenario de la terminal: posiciones 1,2,3; sale la 2
        let remaining = positions_after_removal(&[1, 2, 3], 2);
        assert_eq!(remaining, vec![1, 2]);
        assert!(positions_are_contiguous(&remaining));
    }

    #[test]
    fn test_positions_after_removal_front_and_back() {
        let front = positions_after_removal(&[1, 2, 3, 4], 1);
        assert_eq!(front, vec![1, 2, 3]);

        let back = positions_after_removal(&[1, 2, 3, 4], 4);
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_positions_stay_contiguous_under_any_removal_sequence() {
        let mut positions: Vec<i32> = (1..=8).collect();
        // Elimina alternando frente, medio y fondo
        for removed in [4, 1, 6, 3, 1] {
            positions = positions_after_removal(&positions, removed);
            assert!(positions_are_contiguous(&positions), "gap tras eliminar {}", removed);
        }
        assert_eq!(positions.len(), 3);
    }

    #[test]
    fn test_swap_target_bounds() {
        assert_eq!(swap_target(1, MoveDirection::Up, 5), None);
        assert_eq!(swap_target(2, MoveDirection::Up, 5), Some(1));
        assert_eq!(swap_target(5, MoveDirection::Down, 5), None);
        assert_eq!(swap_target(4, MoveDirection::Down, 5), Some(5));
    }

    #[test]
    fn test_swap_preserves_contiguity() {
        let mut positions = vec![1, 2, 3, 4];
        // Intercambio adyacente 2 <-> 3
        let target = swap_target(2, MoveDirection::Down, 4).unwrap();
        for p in positions.iter_mut() {
            if *p == 2 {
                *p = target;
            } else if *p == target {
                *p = 2;
            }
        }
        assert!(positions_are_contiguous(&positions));
    }

    #[test]
    fn test_positions_are_contiguous_detects_gaps_and_duplicates() {
        assert!(positions_are_contiguous(&[]));
        assert!(positions_are_contiguous(&[1]));
        assert!(positions_are_contiguous(&[3, 1, 2]));
        assert!(!positions_are_contiguous(&[1, 3]));
        assert!(!positions_are_contiguous(&[1, 2, 2]));
        assert!(!positions_are_contiguous(&[0, 1, 2]));
    }
}
