//! Operation lookup along the prototype chain.
//!
//! An [`Operation`] is a callable stored in a record as a
//! [`Field::Operation`]. [`Store::dispatch`] finds the nearest record in the
//! chain that has a field with the requested name and runs it against the
//! record the call was addressed to, never against the ancestor that defined it.
//!
//! The chain is walked on every call, so operations defined on an ancestor
//! after a clone are visible to the clone straight away.
//!
//! ```rust
//! use protogroup::{Operation, Store};
//!
//! let mut store = Store::new();
//! store.create("base", &["greeting", "hello"]).unwrap();
//! store.clone_record("child", "base").unwrap();
//! store.set("child", "greeting", "hi").unwrap();
//!
//! store
//!     .define_operation("base", "greet", Operation::new(|store, this, _args| {
//!         Ok(store.get_by_id(this, "greeting").unwrap_or_default())
//!     }))
//!     .unwrap();
//!
//! let args: [&str; 0] = [];
//! assert_eq!(store.dispatch("child", "greet", &args).unwrap(), "hi");
//! ```

use crate::store::{Field, RecordId, Store};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

type OperationFn = dyn Fn(&mut Store, RecordId, &[String]) -> Result<String> + Send + Sync;

/// A callable attached to a record.
///
/// The closure receives the store, the handle of the record the call was
/// addressed to, and the call arguments.
#[derive(Clone)]
pub struct Operation(Arc<OperationFn>);

impl Operation {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Store, RecordId, &[String]) -> Result<String> + Send + Sync + 'static,
    {
        Operation(Arc::new(f))
    }

    pub fn call(&self, store: &mut Store, subject: RecordId, args: &[String]) -> Result<String> {
        (self.0)(store, subject, args)
    }

    /// Whether both handles refer to the same closure.
    #[must_use]
    pub fn ptr_eq(&self, other: &Operation) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation({:p})", Arc::as_ptr(&self.0))
    }
}

impl Store {
    /// Stores `op` on the named record under `op_name`, replacing any
    /// previous operation of that name.
    ///
    /// # Errors
    ///
    /// Fails if the record does not exist, or if `op_name` already holds data.
    pub fn define_operation(&mut self, name: &str, op_name: &str, op: Operation) -> Result<()> {
        let id = self.require(name)?;
        let record = self
            .record_by_id(id)
            .ok_or_else(|| Error::not_found("record", name))?;
        match record.field(op_name) {
            Some(Field::Operation(_)) | None => {}
            Some(_) => {
                return Err(Error::conflict(
                    op_name,
                    &format!("record '{}' already holds data under this name", name),
                ))
            }
        }
        self.record_mut(id)
            .ok_or_else(|| Error::not_found("record", name))?
            .insert(op_name.to_string(), Field::Operation(op));
        Ok(())
    }

    /// Finds the operation `op_name` would dispatch to, without calling it.
    ///
    /// Returns the handle of the defining record along with the operation.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record or a linked ancestor is missing
    /// - `NotCallable` if the nearest field of that name holds data
    /// - `ChainLimitExceeded` past `max_chain_depth` parent hops
    /// - `NoSuchOperation` at the end of the chain
    pub fn resolve_operation(&self, name: &str, op_name: &str) -> Result<(RecordId, Operation)> {
        let original = self.require(name)?;
        let limit = self.options().max_chain_depth;
        let mut current = original;
        let mut depth = 0;
        loop {
            let record = match self.record_by_id(current) {
                Some(record) => record,
                None => {
                    warn!(record = name, parent = %current, "prototype chain has a dangling link");
                    return Err(Error::not_found(
                        "parent record",
                        &self.dangling_name(original, current),
                    ));
                }
            };
            trace!(record = name, at = %current, depth, operation = op_name, "dispatch hop");
            match record.field(op_name) {
                Some(Field::Operation(op)) => return Ok((current, op.clone())),
                Some(_) => {
                    return Err(Error::NotCallable {
                        record: name.to_string(),
                        operation: op_name.to_string(),
                    })
                }
                None => {}
            }
            match record.parent() {
                Some(parent) => {
                    depth += 1;
                    if depth > limit {
                        return Err(Error::ChainLimitExceeded {
                            record: name.to_string(),
                            operation: op_name.to_string(),
                            limit,
                        });
                    }
                    current = parent;
                }
                None => {
                    return Err(Error::NoSuchOperation {
                        record: name.to_string(),
                        operation: op_name.to_string(),
                    })
                }
            }
        }
    }

    /// Invokes `op_name` on the named record, delegating up the chain.
    ///
    /// The operation runs with the addressed record as its subject.
    ///
    /// # Errors
    ///
    /// Any error of [`Store::resolve_operation`], or whatever the operation
    /// itself returns.
    pub fn dispatch<S: AsRef<str>>(&mut self, name: &str, op_name: &str, args: &[S]) -> Result<String> {
        let (_, op) = self.resolve_operation(name, op_name)?;
        let subject = self.require(name)?;
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        op.call(self, subject, &args)
    }

    /// Name recorded in the link that points at a removed record.
    fn dangling_name(&self, from: RecordId, missing: RecordId) -> String {
        let mut current = Some(from);
        while let Some(id) = current {
            let record = match self.record_by_id(id) {
                Some(record) => record,
                None => break,
            };
            for (_, field) in record.fields() {
                if let Field::Parent { id: parent, name } = field {
                    if *parent == missing {
                        return name.clone();
                    }
                }
            }
            current = record.parent();
        }
        missing.to_string()
    }
}
