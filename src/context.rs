/*!
Named-variable contexts used to seed initial parameter values.

A context maps variable names to flat, column-major real values plus their
declared dimensions. [`MemoryContext`] is the in-memory implementation; with
the `json` feature it can also be read from a JSON object whose members are
numbers or (nested) arrays of numbers.
*/

use crate::error::{EvalError, Result};
use std::collections::BTreeMap;

/// Read-only key to value(s) store.
pub trait VarContext {
    /// Whether a real-valued variable called `name` exists.
    fn contains_r(&self, name: &str) -> bool;

    /// Flat values of `name`.
    fn vals_r(&self, name: &str) -> Result<Vec<f64>>;

    /// Declared dimensions of `name`; empty for scalars.
    fn dims_r(&self, name: &str) -> Result<Vec<usize>>;

    /// Names of every real-valued variable.
    fn names_r(&self) -> Vec<String>;

    /// Values of `name`, checked to hold exactly `expected` entries.
    fn vals_r_checked(&self, name: &str, expected: usize) -> Result<Vec<f64>> {
        let vals = self.vals_r(name)?;
        if vals.len() != expected {
            return Err(EvalError::SizeMismatch {
                name: name.to_owned(),
                expected,
                found: vals.len(),
            });
        }
        Ok(vals)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    values: Vec<f64>,
    dims: Vec<usize>,
}

/// [`VarContext`] backed by an ordered map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryContext {
    vars: BTreeMap<String, Entry>,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scalar.
    pub fn with_scalar(mut self, name: &str, value: f64) -> Self {
        self.insert(name, vec![value], Vec::new());
        self
    }

    /// Adds a one-dimensional array.
    pub fn with_vector(mut self, name: &str, values: Vec<f64>) -> Self {
        let n = values.len();
        self.insert(name, values, vec![n]);
        self
    }

    /// Adds or replaces `name` with the given flat values and dimensions.
    ///
    /// # Panics
    ///
    /// If the product of `dims` does not match `values.len()`.
    pub fn insert(&mut self, name: &str, values: Vec<f64>, dims: Vec<usize>) {
        assert_eq!(
            dims.iter().product::<usize>(),
            values.len(),
            "dimensions of `{}` do not match its number of values",
            name
        );
        self.vars.insert(name.to_owned(), Entry { values, dims });
    }

    fn entry(&self, name: &str) -> Result<&Entry> {
        self.vars
            .get(name)
            .ok_or_else(|| EvalError::MissingVariable(name.to_owned()))
    }
}

impl VarContext for MemoryContext {
    fn contains_r(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    fn vals_r(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.entry(name)?.values.clone())
    }

    fn dims_r(&self, name: &str) -> Result<Vec<usize>> {
        Ok(self.entry(name)?.dims.clone())
    }

    fn names_r(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }
}

#[cfg(feature = "json")]
mod json {
    use super::MemoryContext;
    use crate::error::{EvalError, Result};
    use serde_json::Value;

    impl MemoryContext {
        /// Parses `{"name": number | [number, ...] | [[...], ...], ...}`.
        ///
        /// Nested arrays are stored column-major, the layout parameter
        /// transforms read them in.
        pub fn from_json_str(text: &str) -> Result<Self> {
            let root: Value = serde_json::from_str(text)?;
            let object = root
                .as_object()
                .ok_or_else(|| EvalError::domain("variable context must be a JSON object"))?;

            let mut ctx = MemoryContext::new();
            for (name, value) in object {
                let mut dims = Vec::new();
                shape_of(value, &mut dims);
                let mut row_major = Vec::new();
                flatten(name, value, &mut row_major)?;
                if dims.iter().product::<usize>() != row_major.len() {
                    return Err(EvalError::domain(format!("variable `{}` is ragged", name)));
                }
                ctx.insert(name, to_column_major(&row_major, &dims), dims);
            }
            Ok(ctx)
        }
    }

    fn shape_of(value: &Value, dims: &mut Vec<usize>) {
        if let Value::Array(items) = value {
            dims.push(items.len());
            if let Some(first) = items.first() {
                shape_of(first, dims);
            }
        }
    }

    fn flatten(name: &str, value: &Value, out: &mut Vec<f64>) -> Result<()> {
        match value {
            Value::Number(n) => {
                let x = n.as_f64().ok_or_else(|| {
                    EvalError::domain(format!("variable `{}` holds a non-finite number", name))
                })?;
                out.push(x);
                Ok(())
            }
            Value::Array(items) => items.iter().try_for_each(|v| flatten(name, v, out)),
            _ => Err(EvalError::domain(format!(
                "variable `{}` must contain only numbers",
                name
            ))),
        }
    }

    fn to_column_major(row_major: &[f64], dims: &[usize]) -> Vec<f64> {
        if dims.len() < 2 {
            return row_major.to_vec();
        }
        let n = row_major.len();
        let mut out = vec![0.0; n];
        let mut index = vec![0usize; dims.len()];
        for &x in row_major {
            // column-major offset: first index varies fastest
            let mut offset = 0;
            let mut stride = 1;
            for (i, &d) in index.iter().zip(dims) {
                offset += i * stride;
                stride *= d;
            }
            out[offset] = x;
            // advance the row-major multi-index: last index varies fastest
            for k in (0..dims.len()).rev() {
                index[k] += 1;
                if index[k] < dims[k] {
                    break;
                }
                index[k] = 0;
            }
        }
        out
    }

}
