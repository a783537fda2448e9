//! The process-wide interpreter.
//!
//! A running app has exactly one interpreter, owned by the UI thread. The
//! instance lives in a thread-local slot; every access goes through
//! [`with_interpreter`], which refuses re-entrant use instead of aliasing.

use std::cell::RefCell;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use yail_core::ReturnChannel;

use crate::config::{ConfigError, RuntimeConfig};
use crate::interpreter::Interpreter;

thread_local! {
    static INTERPRETER: RefCell<Option<Interpreter>> = const { RefCell::new(None) };
}

#[derive(Debug, Error)]
pub enum GlobalError {
    #[error("interpreter already initialized on this thread")]
    AlreadyInitialized,

    #[error("interpreter not initialized on this thread")]
    NotInitialized,

    #[error("interpreter is already in use")]
    Busy,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Create the interpreter for this thread.
pub fn init(config: RuntimeConfig) -> Result<(), GlobalError> {
    install(|| Interpreter::new(config))
}

/// Create the interpreter for this thread, reporting into `channel`.
pub fn init_with_channel(config: RuntimeConfig, channel: Arc<ReturnChannel>) -> Result<(), GlobalError> {
    install(|| Interpreter::with_channel(config, channel))
}

fn install<F>(build: F) -> Result<(), GlobalError>
where
    F: FnOnce() -> Result<Interpreter, ConfigError>,
{
    INTERPRETER.with(|slot| {
        let mut slot = slot.try_borrow_mut().map_err(|_| GlobalError::Busy)?;
        if slot.is_some() {
            return Err(GlobalError::AlreadyInitialized);
        }
        *slot = Some(build()?);
        info!("interpreter initialized");
        Ok(())
    })
}

/// Run `f` against this thread's interpreter.
pub fn with_interpreter<R>(f: impl FnOnce(&mut Interpreter) -> R) -> Result<R, GlobalError> {
    INTERPRETER.with(|slot| {
        let mut slot = slot.try_borrow_mut().map_err(|_| GlobalError::Busy)?;
        let interpreter = slot.as_mut().ok_or(GlobalError::NotInitialized)?;
        Ok(f(interpreter))
    })
}

/// Drop this thread's interpreter. Returns false if there was none.
pub fn teardown() -> bool {
    INTERPRETER.with(|slot| match slot.try_borrow_mut() {
        Ok(mut slot) => {
            let existed = slot.take().is_some();
            if existed {
                info!("interpreter torn down");
            }
            existed
        }
        Err(_) => false,
    })
}

pub fn is_initialized() -> bool {
    INTERPRETER.with(|slot| slot.try_borrow().map(|s| s.is_some()).unwrap_or(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        assert!(!is_initialized());
        assert!(matches!(with_interpreter(|_| ()), Err(GlobalError::NotInitialized)));

        init(RuntimeConfig::default()).unwrap();
        assert!(is_initialized());
        assert!(matches!(init(RuntimeConfig::default()), Err(GlobalError::AlreadyInitialized)));

        let value = with_interpreter(|interp| interp.evaluate("(+ 1 2)")).unwrap();
        assert_eq!(value, yail_core::Value::Number(3.0));

        assert!(teardown());
        assert!(!teardown());
        assert!(!is_initialized());
    }

    #[test]
    fn test_reentrant_access_is_refused() {
        init(RuntimeConfig::default()).unwrap();
        let nested = with_interpreter(|_| with_interpreter(|_| ()).map(|_| ())).unwrap();
        assert!(matches!(nested, Err(GlobalError::Busy)));
        teardown();
    }

    #[test]
    fn test_bad_config_leaves_slot_empty() {
        let config = RuntimeConfig {
            time_zone: "Mars/Olympus_Mons".to_string(),
            ..RuntimeConfig::default()
        };
        assert!(matches!(init(config), Err(GlobalError::Config(_))));
        assert!(!is_initialized());
    }
}
