use std::fmt;

/// Which log-density variant to compute.
///
/// `propto` drops normalizing constants the model declares droppable;
/// `jacobian` adds the log-absolute-determinant of the unconstraining transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LogDensityMode {
    pub propto: bool,
    pub jacobian: bool,
}

impl LogDensityMode {
    /// Full density, no Jacobian term.
    pub const PLAIN: Self = Self::new(false, false);
    /// Full density with the Jacobian term.
    pub const JACOBIAN: Self = Self::new(false, true);
    /// Density up to a constant, no Jacobian term.
    pub const PROPTO: Self = Self::new(true, false);
    /// Density up to a constant with the Jacobian term.
    pub const PROPTO_JACOBIAN: Self = Self::new(true, true);

    /// All four variants, in `(propto, jacobian)` lexicographic order.
    pub const ALL: [Self; 4] = [
        Self::PLAIN,
        Self::JACOBIAN,
        Self::PROPTO,
        Self::PROPTO_JACOBIAN,
    ];

    pub const fn new(propto: bool, jacobian: bool) -> Self {
        Self { propto, jacobian }
    }
}

impl fmt::Display for LogDensityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "propto={}, jacobian={}", self.propto, self.jacobian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_modes_distinct() {
        let set: HashSet<_> = LogDensityMode::ALL.iter().copied().collect();
        assert_eq!(set.len(), 4);
        assert_eq!(LogDensityMode::default(), LogDensityMode::PLAIN);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LogDensityMode::PROPTO.to_string(),
            "propto=true, jacobian=false"
        );
    }
}
