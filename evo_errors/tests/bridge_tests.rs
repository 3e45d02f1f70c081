//! End-to-end behaviour of construction, introspection, the panic bridge
//! and the rollback guard, as seen by a downstream crate.

use evo_errors::prelude::*;
use std::cell::Cell;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{LazyLock, Once};

static INIT: Once = Once::new();

/// Route library events to the test writer; `RUST_LOG=evo_errors=trace` shows them.
fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, thiserror::Error)]
enum DriveError {
    #[error("axis {0} not referenced")]
    NotReferenced(u8),
    #[error("drive fault on axis {axis}")]
    Fault {
        axis: u8,
        #[source]
        source: io::Error,
    },
}

static ERR_ESTOP: LazyLock<Error> = LazyLock::new(|| evo_errors::new("emergency stop"));

fn move_axis(axis: u8) -> Result<f64, Error> {
    match axis {
        0 => Ok(12.5),
        1 => Err(DriveError::NotReferenced(axis).into()),
        2 => Err(Error::new(DriveError::Fault {
            axis,
            source: io::Error::new(io::ErrorKind::TimedOut, "bus timeout"),
        })),
        _ => Err(ERR_ESTOP.clone()),
    }
}

#[test]
fn plain_message_is_verbatim() {
    let e = evo_errors::new("config %v missing");
    assert_eq!(e.to_string(), "config %v missing");
    assert!(unwraps(&e).is_empty());
}

#[test]
fn formatted_message_wraps_error_arguments() {
    let cause = move_axis(1).unwrap_err();
    let e = err!("{} failed: {}", "homing", cause);
    assert_eq!(e.to_string(), "homing failed: axis 1 not referenced");
    assert_eq!(unwraps(&e), [cause]);

    let e = err!("{} and {}", 42, ERR_ESTOP.clone());
    assert_eq!(e.to_string(), "42 and emergency stop");
    assert_eq!(unwraps(&e), [ERR_ESTOP.clone()]);
}

#[test]
fn formatted_message_adopts_foreign_errors() {
    let e = err!(
        "homing axis {axis}: {fault}",
        axis = 4,
        fault = DriveError::NotReferenced(4)
    );
    assert_eq!(e.to_string(), "homing axis 4: axis 4 not referenced");
    assert_eq!(unwraps(&e).len(), 1);
    assert!(matches!(
        to::<DriveError>(&e),
        Some(DriveError::NotReferenced(4))
    ));
}

#[test]
fn provenance_points_at_caller() {
    let e = err!("axis {} lost", 3);
    let location = e.location().unwrap();
    assert!(location.file().ends_with("bridge_tests.rs"));
    assert!(evo_errors::new("plain").location().is_none());
}

#[test]
fn typed_lookup_at_any_depth() {
    let fault = move_axis(2).unwrap_err();
    let e = join([
        err!("cycle {}: {}", 7, evo_errors::new("overrun")),
        err!("recipe aborted: {}", fault),
    ])
    .unwrap();

    match to::<DriveError>(&e) {
        Some(DriveError::Fault { axis, .. }) => assert_eq!(*axis, 2),
        other => panic!("unexpected lookup result: {other:?}"),
    }
    let timeout = to::<io::Error>(&e).unwrap();
    assert_eq!(timeout.kind(), io::ErrorKind::TimedOut);
    assert!(to::<std::fmt::Error>(&e).is_none());
}

#[test]
fn single_unwrap_follows_source() {
    let fault = move_axis(2).unwrap_err();
    assert_eq!(unwrap(&fault).unwrap().to_string(), "bus timeout");
}

#[test]
fn check_and_get_short_circuit() {
    init_tracing();
    assert_eq!(get(move_axis(0)), 12.5);
    check(move_axis(0).map(|_| ()));

    let payload = catch_unwind(|| get(move_axis(9))).unwrap_err();
    let raised = payload.downcast::<Error>().unwrap();
    assert_eq!(*raised, *ERR_ESTOP);
}

#[test]
fn run_set_collects_cleanup_failures() {
    let mut slot: Option<Error> = None;
    for axis in [0, 1, 3] {
        run_set(|| move_axis(axis).map(|_| ()), &mut slot);
    }
    let joined = slot.unwrap();
    assert_eq!(unwraps(&joined).len(), 2);
    assert!(is(&joined, &ERR_ESTOP));
    assert!(to::<DriveError>(&joined).is_some());
    assert_eq!(
        joined.to_string(),
        "axis 1 not referenced\nemergency stop"
    );
}

#[test]
fn catch_absorbs_matching_panic() {
    init_tracing();
    let handled = Cell::new(false);
    let out = catch(
        &ERR_ESTOP,
        || {
            let position = get(move_axis(9));
            position * 2.0
        },
        |original| {
            assert!(is(&original, &ERR_ESTOP));
            handled.set(true);
            Ok(())
        },
    );
    assert_eq!(out, None);
    assert!(handled.get());
}

#[test]
fn catch_absorbs_wrapped_target() {
    let out = catch(
        &ERR_ESTOP,
        || run(|| Err(err!("stopping line: {}", ERR_ESTOP.clone()))),
        |_| Ok(()),
    );
    assert_eq!(out, None);
}

#[test]
fn catch_lets_other_panics_through() {
    init_tracing();
    let unrelated = catch_unwind(AssertUnwindSafe(|| {
        catch(&ERR_ESTOP, || get(move_axis(1)), |_| Ok(()))
    }))
    .unwrap_err();
    let error = unrelated.downcast::<Error>().unwrap();
    assert_eq!(error.to_string(), "axis 1 not referenced");

    let foreign = catch_unwind(AssertUnwindSafe(|| {
        catch(&ERR_ESTOP, || -> u8 { panic!("index out of range") }, |_| Ok(()))
    }))
    .unwrap_err();
    assert_eq!(foreign.downcast_ref::<&str>(), Some(&"index out of range"));
}

#[test]
fn nested_catch_rethrows_replacement() {
    let replacement = evo_errors::new("recovery failed");
    let target = replacement.clone();
    let out = catch(
        &target,
        || {
            catch(&ERR_ESTOP, || get(move_axis(9)), move |_| Err(replacement))
        },
        |_| Ok(()),
    );
    assert_eq!(out, None);
}

#[test]
fn on_fail_rolls_back_unless_marked() {
    let rollbacks = Cell::new(0);

    let provision = |axis: u8| -> Result<f64, Error> {
        let guard = on_fail(|| rollbacks.set(rollbacks.get() + 1));
        let position = move_axis(axis)?;
        guard.succeed();
        Ok(position)
    };

    assert!(provision(0).is_ok());
    assert_eq!(rollbacks.get(), 0);

    assert!(provision(1).is_err());
    assert_eq!(rollbacks.get(), 1);
}
