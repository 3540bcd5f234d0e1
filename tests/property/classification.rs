//! Properties of outcome classification and the doctor mapping

use dxready::doctor::{DoctorMapper, DoctorStatus};
use dxready::readiness::{outcome_status, ConfirmationStatus, OutcomeStatus, ReadinessStatus};
use proptest::prelude::*;

fn readiness_status() -> impl Strategy<Value = ReadinessStatus> {
    prop_oneof![
        Just(ReadinessStatus::Ready),
        Just(ReadinessStatus::Pending),
        Just(ReadinessStatus::Blocked),
    ]
}

fn confirmation_status() -> impl Strategy<Value = Option<ConfirmationStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(ConfirmationStatus::Ready)),
        Just(Some(ConfirmationStatus::Pending)),
    ]
}

fn outcome() -> impl Strategy<Value = OutcomeStatus> {
    prop_oneof![
        Just(OutcomeStatus::Ready),
        Just(OutcomeStatus::Updated),
        Just(OutcomeStatus::Pending),
        Just(OutcomeStatus::Blocked),
        Just(OutcomeStatus::Failed),
    ]
}

/// Classification never reports failed, and only a ready confirmation is usable
#[test]
fn test_outcome_classification_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(readiness_status(), confirmation_status(), any::<bool>()),
            |(detection, confirmation, performed_work)| {
                let status = outcome_status(detection, confirmation, performed_work);

                prop_assert_ne!(status, OutcomeStatus::Failed);
                if detection == ReadinessStatus::Blocked {
                    prop_assert_eq!(status, OutcomeStatus::Blocked);
                    return Ok(());
                }
                match confirmation {
                    Some(ConfirmationStatus::Ready) if performed_work => {
                        prop_assert_eq!(status, OutcomeStatus::Updated);
                    }
                    Some(ConfirmationStatus::Ready) => {
                        prop_assert_eq!(status, OutcomeStatus::Ready);
                    }
                    _ => {
                        prop_assert_eq!(status, OutcomeStatus::Pending);
                    }
                }
                prop_assert_eq!(
                    status.is_usable(),
                    confirmation == Some(ConfirmationStatus::Ready)
                );
                Ok(())
            },
        )
        .unwrap();
}

/// Without overrides, doctor status depends on the outcome only
#[test]
fn test_doctor_mapping_property() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let mapper = DoctorMapper::default();

    runner
        .run(&("[a-z][a-z-]{0,12}", outcome()), |(key, status)| {
            prop_assume!(key != "php-runtime");
            let mapped = mapper.status_for(&key, status);

            prop_assert_eq!(mapped, DoctorStatus::default_for(status));
            prop_assert_eq!(mapped == DoctorStatus::Pass, status.is_usable());
            prop_assert_eq!(mapped == DoctorStatus::Fail, status == OutcomeStatus::Failed);
            Ok(())
        })
        .unwrap();
}
