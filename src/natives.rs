use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::interpreter::{ActivationRecord, RuntimeError, Value};
use crate::symbol::FuncSymbol;

/// A native implementation: reads its arguments from the frame built for
/// the call, may append lines to the program's output, and may return a
/// value.
pub type NativeHandler =
    Box<dyn Fn(&ActivationRecord, &mut Vec<String>) -> Result<Option<Value>, RuntimeError>>;

struct NativeEntry {
    symbol: Rc<FuncSymbol>,
    handler: NativeHandler,
}

/// Host-implemented functions, addressable from programs exactly like
/// declared ones. Populated before a run and read-only while one executes;
/// name resolution consults this table before any scope.
pub struct NativeRegistry {
    entries: FxHashMap<String, NativeEntry>,
}

impl NativeRegistry {
    pub fn new() -> NativeRegistry {
        NativeRegistry {
            entries: FxHashMap::default(),
        }
    }

    /// The stock set every program gets: `print` and `randInt`.
    pub fn standard() -> NativeRegistry {
        let mut registry = NativeRegistry::new();

        registry.register("print", &[("message", "STRING")], |frame, output| {
            let message = frame.get("message")?;
            output.push(message.to_string());
            Ok(None)
        });

        registry.register(
            "randInt",
            &[("x", "INTEGER"), ("y", "INTEGER")],
            |frame, _output| {
                let x = frame.get("x")?;
                let y = frame.get("y")?;
                let (Value::Integer(x), Value::Integer(y)) = (&x, &y) else {
                    return Err(RuntimeError::NativeCall {
                        message: "randInt expects two integers".to_string(),
                    });
                };
                let (Some(low), Some(high)) = (x.to_i64(), y.to_i64()) else {
                    return Err(RuntimeError::NativeCall {
                        message: "randInt bounds must fit a 64-bit integer".to_string(),
                    });
                };
                if low >= high {
                    return Err(RuntimeError::NativeCall {
                        message: format!("randInt requires x < y, got {low} and {high}"),
                    });
                }
                let value = rand::thread_rng().gen_range(low..high);
                Ok(Some(Value::Integer(BigInt::from(value))))
            },
        );

        registry
    }

    /// Adds or replaces a native. `params` pairs each formal parameter name
    /// with its declared type spelling.
    pub fn register<F>(&mut self, name: &str, params: &[(&str, &'static str)], handler: F)
    where
        F: Fn(&ActivationRecord, &mut Vec<String>) -> Result<Option<Value>, RuntimeError> + 'static,
    {
        self.entries.insert(
            name.to_string(),
            NativeEntry {
                symbol: FuncSymbol::native(name, params),
                handler: Box::new(handler),
            },
        );
    }

    pub fn symbol(&self, name: &str) -> Option<Rc<FuncSymbol>> {
        self.entries.get(name).map(|entry| Rc::clone(&entry.symbol))
    }

    pub fn call(
        &self,
        name: &str,
        frame: &ActivationRecord,
        output: &mut Vec<String>,
    ) -> Result<Option<Value>, RuntimeError> {
        match self.entries.get(name) {
            Some(entry) => (entry.handler)(frame, output),
            None => Err(RuntimeError::NativeCall {
                message: format!("Native function {name} is not defined"),
            }),
        }
    }
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use crate::interpreter::{ActivationRecord, FrameKind, RuntimeError, Value};

    use super::NativeRegistry;

    fn frame_with(bindings: &[(&str, Value)]) -> ActivationRecord {
        let mut frame = ActivationRecord::new("test", FrameKind::Function, 2);
        for (name, value) in bindings {
            frame.set(name, value.clone());
        }
        frame
    }

    #[test]
    fn print_appends_the_textual_form() {
        let registry = NativeRegistry::standard();
        let mut output = Vec::new();

        let frame = frame_with(&[("message", Value::Str("hi".to_string()))]);
        let result = registry.call("print", &frame, &mut output).expect("print failed");
        assert_eq!(result, None);

        let frame = frame_with(&[("message", Value::Integer(BigInt::from(42)))]);
        registry.call("print", &frame, &mut output).expect("print failed");

        let frame = frame_with(&[("message", Value::Empty)]);
        registry.call("print", &frame, &mut output).expect("print failed");

        assert_eq!(output, vec!["hi", "42", "null"]);
    }

    #[test]
    fn print_without_an_argument_reports_the_unbound_name() {
        let registry = NativeRegistry::standard();
        let mut output = Vec::new();
        let err = registry
            .call("print", &frame_with(&[]), &mut output)
            .unwrap_err();
        assert_eq!(
            err,
            RuntimeError::NotBound {
                name: "message".to_string()
            }
        );
    }

    #[test]
    fn rand_int_with_an_empty_range_fails() {
        let registry = NativeRegistry::standard();
        let mut output = Vec::new();
        let frame = frame_with(&[
            ("x", Value::Integer(BigInt::from(5))),
            ("y", Value::Integer(BigInt::from(5))),
        ]);
        let err = registry.call("randInt", &frame, &mut output).unwrap_err();
        assert!(err.to_string().contains("requires x < y"));
    }

    #[test]
    fn rand_int_on_a_single_value_range_is_deterministic() {
        let registry = NativeRegistry::standard();
        let mut output = Vec::new();
        let frame = frame_with(&[
            ("x", Value::Integer(BigInt::from(0))),
            ("y", Value::Integer(BigInt::from(1))),
        ]);
        let value = registry
            .call("randInt", &frame, &mut output)
            .expect("randInt failed");
        assert_eq!(value, Some(Value::Integer(BigInt::from(0))));
    }

    #[test]
    fn rand_int_rejects_non_integer_arguments() {
        let registry = NativeRegistry::standard();
        let mut output = Vec::new();
        let frame = frame_with(&[
            ("x", Value::Str("0".to_string())),
            ("y", Value::Integer(BigInt::from(1))),
        ]);
        let err = registry.call("randInt", &frame, &mut output).unwrap_err();
        assert_eq!(err.to_string(), "randInt expects two integers");
    }

    #[test]
    fn unregistered_names_fail_the_call() {
        let registry = NativeRegistry::new();
        let mut output = Vec::new();
        let err = registry
            .call("print", &frame_with(&[]), &mut output)
            .unwrap_err();
        assert_eq!(err.to_string(), "Native function print is not defined");
    }

    #[test]
    fn hosts_can_register_their_own_functions() {
        let mut registry = NativeRegistry::standard();
        registry.register("greet", &[("who", "STRING")], |frame, output| {
            let who = frame.get("who")?;
            output.push(format!("hello {who}"));
            Ok(Some(Value::Str("done".to_string())))
        });

        let symbol = registry.symbol("greet").expect("symbol missing");
        assert!(symbol.is_native);
        assert_eq!(symbol.formal_params.borrow().len(), 1);

        let mut output = Vec::new();
        let frame = frame_with(&[("who", Value::Str("world".to_string()))]);
        let value = registry
            .call("greet", &frame, &mut output)
            .expect("greet failed");
        assert_eq!(value, Some(Value::Str("done".to_string())));
        assert_eq!(output, vec!["hello world"]);
    }
}
