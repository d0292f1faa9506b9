use futures::TryStreamExt as _;
use serde_json::{json, Value};
use tracing::{debug, trace};

use super::coll::Collection;
use crate::{document::lookup_path, filtering::matches_filters, Aggregation, Filter, Result};

/// Running totals for a numeric field. Integer sums stay exact until a float
/// or an overflow is seen.
#[derive(Debug, Default)]
struct NumericAccumulator {
    count:       usize,
    int_sum:     Option<i64>,
    float_sum:   f64,
    all_integer: bool,
    min:         Option<f64>,
    max:         Option<f64>,
    min_value:   Option<Value>,
    max_value:   Option<Value>,
}

impl NumericAccumulator {
    fn new() -> Self {
        Self {
            int_sum: Some(0),
            all_integer: true,
            ..Self::default()
        }
    }

    fn push(&mut self, value: &Value) {
        let Value::Number(ref n) = *value
        else {
            return;
        };
        let Some(as_float) = n.as_f64()
        else {
            return;
        };

        self.count = self.count.saturating_add(1);
        self.float_sum += as_float;
        match n.as_i64() {
            Some(i) => self.int_sum = self.int_sum.and_then(|sum| sum.checked_add(i)),
            None => self.all_integer = false,
        }
        if self.min.is_none_or(|min| as_float < min) {
            self.min = Some(as_float);
            self.min_value = Some(value.clone());
        }
        if self.max.is_none_or(|max| as_float > max) {
            self.max = Some(as_float);
            self.max_value = Some(value.clone());
        }
    }

    fn sum(&self) -> Value {
        match self.int_sum {
            Some(sum) if self.all_integer => json!(sum),
            Some(_) | None => json!(self.float_sum),
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "document counts are far below 2^52"
    )]
    fn avg(&self) -> Value {
        if self.count == 0 {
            Value::Null
        }
        else {
            json!(self.float_sum / self.count as f64)
        }
    }
}

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for Collection are intentional for organization"
)]
impl Collection {
    /// Computes an aggregation over the documents matching `filters`.
    ///
    /// Only numeric field values take part in `Sum`, `Avg`, `Min` and `Max`.
    /// `Sum` of integers is an integer; any float makes it a float. `Avg`,
    /// `Min` and `Max` are `null` when no numeric value is found, and `Sum`
    /// is `0`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use emporium_store::{Aggregation, Store, StoreConfig};
    /// use serde_json::json;
    ///
    /// # async fn example() -> emporium_store::Result<()> {
    /// let store = Store::open("/tmp/emporium-agg", StoreConfig::default()).await?;
    /// let products = store.collection("products").await?;
    /// products.insert("p1", json!({"stock": 3})).await?;
    /// products.insert("p2", json!({"stock": 4})).await?;
    ///
    /// let total = products.aggregate(&[], Aggregation::Sum("stock".to_owned())).await?;
    /// assert_eq!(total, json!(7));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn aggregate(&self, filters: &[Filter], aggregation: Aggregation) -> Result<Value> {
        trace!("Performing aggregation {:?} on {}", aggregation, self.name);

        let field = match aggregation {
            Aggregation::Count => None,
            Aggregation::Sum(ref field) |
            Aggregation::Avg(ref field) |
            Aggregation::Min(ref field) |
            Aggregation::Max(ref field) => Some(field.as_str()),
        };

        let mut count = 0usize;
        let mut acc = NumericAccumulator::new();
        let mut documents = self.all();
        while let Some(doc) = documents.try_next().await? {
            if !matches_filters(&doc, filters) {
                continue;
            }
            count = count.saturating_add(1);
            if let Some(field) = field
                && let Some(value) = lookup_path(&doc.data, field)
            {
                acc.push(value);
            }
        }

        let result = match aggregation {
            Aggregation::Count => json!(count),
            Aggregation::Sum(_) => acc.sum(),
            Aggregation::Avg(_) => acc.avg(),
            Aggregation::Min(_) => acc.min_value.unwrap_or(Value::Null),
            Aggregation::Max(_) => acc.max_value.unwrap_or(Value::Null),
        };

        debug!("Aggregation result: {}", result);
        Ok(result)
    }
}
