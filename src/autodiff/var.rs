use super::arena::{Arena, NodeRef};
use num_traits::{Float, Num, NumCast, One, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::num::FpCategory;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Sub, SubAssign};

#[derive(Clone, Copy)]
struct Tracked<'a> {
    arena: &'a Arena,
    node: NodeRef,
}

/// Reverse-mode dual number: a primal value plus, unless it is a constant,
/// the arena node that records how it was computed.
///
/// Every operation on a tracked `Var` appends one node holding the local
/// partial derivatives; operations on constants only touch the primal value.
#[derive(Clone, Copy)]
pub struct Var<'a> {
    value: f64,
    node: Option<Tracked<'a>>,
}

impl<'a> Var<'a> {
    /// A value that does not depend on any independent variable.
    pub const fn constant(value: f64) -> Self {
        Self { value, node: None }
    }

    pub(crate) fn tracked(value: f64, arena: &'a Arena, node: NodeRef) -> Self {
        Self {
            value,
            node: Some(Tracked { arena, node }),
        }
    }

    /// Primal value.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_constant(&self) -> bool {
        self.node.is_none()
    }

    pub(crate) fn index(&self) -> Option<usize> {
        self.node.map(|t| t.node.index)
    }

    pub(crate) fn node_ref(&self) -> Option<NodeRef> {
        self.node.map(|t| t.node)
    }

    fn unary(self, value: f64, partial: f64) -> Self {
        match self.node {
            None => Var::constant(value),
            Some(t) => Var::tracked(value, t.arena, t.arena.push(&[(t.node, partial)])),
        }
    }

    fn binary(self, rhs: Self, value: f64, d_lhs: f64, d_rhs: f64) -> Self {
        match (self.node, rhs.node) {
            (None, None) => Var::constant(value),
            (Some(a), None) => Var::tracked(value, a.arena, a.arena.push(&[(a.node, d_lhs)])),
            (None, Some(b)) => Var::tracked(value, b.arena, b.arena.push(&[(b.node, d_rhs)])),
            (Some(a), Some(b)) => {
                debug_assert!(
                    std::ptr::eq(a.arena, b.arena),
                    "operands recorded on different arenas"
                );
                let node = a.arena.push(&[(a.node, d_lhs), (b.node, d_rhs)]);
                Var::tracked(value, a.arena, node)
            }
        }
    }
}

impl fmt::Debug for Var<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("value", &self.value)
            .field("index", &self.index())
            .finish()
    }
}

impl fmt::Display for Var<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

impl PartialEq for Var<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for Var<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

// ---- arithmetic ----

impl<'a> Add for Var<'a> {
    type Output = Var<'a>;
    fn add(self, rhs: Self) -> Self {
        self.binary(rhs, self.value + rhs.value, 1.0, 1.0)
    }
}

impl<'a> Sub for Var<'a> {
    type Output = Var<'a>;
    fn sub(self, rhs: Self) -> Self {
        self.binary(rhs, self.value - rhs.value, 1.0, -1.0)
    }
}

impl<'a> Mul for Var<'a> {
    type Output = Var<'a>;
    fn mul(self, rhs: Self) -> Self {
        self.binary(rhs, self.value * rhs.value, rhs.value, self.value)
    }
}

impl<'a> Div for Var<'a> {
    type Output = Var<'a>;
    fn div(self, rhs: Self) -> Self {
        let value = self.value / rhs.value;
        self.binary(rhs, value, 1.0 / rhs.value, -value / rhs.value)
    }
}

impl<'a> Rem for Var<'a> {
    type Output = Var<'a>;
    fn rem(self, rhs: Self) -> Self {
        let value = self.value % rhs.value;
        self.binary(rhs, value, 1.0, -(self.value / rhs.value).trunc())
    }
}

impl<'a> Neg for Var<'a> {
    type Output = Var<'a>;
    fn neg(self) -> Self {
        self.unary(-self.value, -1.0)
    }
}

impl AddAssign for Var<'_> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Var<'_> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Var<'_> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Var<'_> {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl<'a> Sum for Var<'a> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Var::constant(0.0), |acc, x| acc + x)
    }
}

// ---- num-traits plumbing ----

impl Zero for Var<'_> {
    fn zero() -> Self {
        Var::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

impl One for Var<'_> {
    fn one() -> Self {
        Var::constant(1.0)
    }
}

impl Num for Var<'_> {
    type FromStrRadixErr = <f64 as Num>::FromStrRadixErr;

    fn from_str_radix(s: &str, radix: u32) -> Result<Self, Self::FromStrRadixErr> {
        <f64 as Num>::from_str_radix(s, radix).map(Var::constant)
    }
}

impl ToPrimitive for Var<'_> {
    fn to_i64(&self) -> Option<i64> {
        self.value.to_i64()
    }

    fn to_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }

    fn to_f32(&self) -> Option<f32> {
        self.value.to_f32()
    }

    fn to_f64(&self) -> Option<f64> {
        Some(self.value)
    }
}

impl NumCast for Var<'_> {
    fn from<N: ToPrimitive>(n: N) -> Option<Self> {
        n.to_f64().map(Var::constant)
    }
}

#[allow(deprecated)]
impl Float for Var<'_> {
    fn nan() -> Self {
        Var::constant(f64::NAN)
    }

    fn infinity() -> Self {
        Var::constant(f64::INFINITY)
    }

    fn neg_infinity() -> Self {
        Var::constant(f64::NEG_INFINITY)
    }

    fn neg_zero() -> Self {
        Var::constant(-0.0)
    }

    fn min_value() -> Self {
        Var::constant(f64::MIN)
    }

    fn min_positive_value() -> Self {
        Var::constant(f64::MIN_POSITIVE)
    }

    fn epsilon() -> Self {
        Var::constant(f64::EPSILON)
    }

    fn max_value() -> Self {
        Var::constant(f64::MAX)
    }

    fn is_nan(self) -> bool {
        self.value.is_nan()
    }

    fn is_infinite(self) -> bool {
        self.value.is_infinite()
    }

    fn is_finite(self) -> bool {
        self.value.is_finite()
    }

    fn is_normal(self) -> bool {
        self.value.is_normal()
    }

    fn classify(self) -> FpCategory {
        self.value.classify()
    }

    // Piecewise-constant functions have a zero derivative almost everywhere.
    fn floor(self) -> Self {
        Var::constant(self.value.floor())
    }

    fn ceil(self) -> Self {
        Var::constant(self.value.ceil())
    }

    fn round(self) -> Self {
        Var::constant(self.value.round())
    }

    fn trunc(self) -> Self {
        Var::constant(self.value.trunc())
    }

    fn fract(self) -> Self {
        self.unary(self.value.fract(), 1.0)
    }

    fn abs(self) -> Self {
        let d = if self.value > 0.0 {
            1.0
        } else if self.value < 0.0 {
            -1.0
        } else {
            0.0
        };
        self.unary(self.value.abs(), d)
    }

    fn signum(self) -> Self {
        Var::constant(self.value.signum())
    }

    fn is_sign_positive(self) -> bool {
        self.value.is_sign_positive()
    }

    fn is_sign_negative(self) -> bool {
        self.value.is_sign_negative()
    }

    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }

    fn recip(self) -> Self {
        let r = self.value.recip();
        self.unary(r, -r * r)
    }

    fn powi(self, n: i32) -> Self {
        let d = if n == 0 {
            0.0
        } else {
            <f64 as From<i32>>::from(n) * self.value.powi(n - 1)
        };
        self.unary(self.value.powi(n), d)
    }

    fn powf(self, n: Self) -> Self {
        let value = self.value.powf(n.value);
        let d_base = if n.value == 0.0 {
            0.0
        } else {
            n.value * self.value.powf(n.value - 1.0)
        };
        let d_exp = if self.value > 0.0 {
            value * self.value.ln()
        } else {
            0.0
        };
        self.binary(n, value, d_base, d_exp)
    }

    fn sqrt(self) -> Self {
        let s = self.value.sqrt();
        self.unary(s, 0.5 / s)
    }

    fn exp(self) -> Self {
        let e = self.value.exp();
        self.unary(e, e)
    }

    fn exp2(self) -> Self {
        let e = self.value.exp2();
        self.unary(e, e * std::f64::consts::LN_2)
    }

    fn ln(self) -> Self {
        self.unary(self.value.ln(), 1.0 / self.value)
    }

    fn log(self, base: Self) -> Self {
        self.ln() / base.ln()
    }

    fn log2(self) -> Self {
        self.unary(self.value.log2(), 1.0 / (self.value * std::f64::consts::LN_2))
    }

    fn log10(self) -> Self {
        self.unary(
            self.value.log10(),
            1.0 / (self.value * std::f64::consts::LN_10),
        )
    }

    fn max(self, other: Self) -> Self {
        if self.value.is_nan() || other.value > self.value {
            other
        } else {
            self
        }
    }

    fn min(self, other: Self) -> Self {
        if self.value.is_nan() || other.value < self.value {
            other
        } else {
            self
        }
    }

    fn abs_sub(self, other: Self) -> Self {
        if self.value <= other.value {
            Var::constant(0.0)
        } else {
            self - other
        }
    }

    fn cbrt(self) -> Self {
        let c = self.value.cbrt();
        self.unary(c, 1.0 / (3.0 * c * c))
    }

    fn hypot(self, other: Self) -> Self {
        let h = self.value.hypot(other.value);
        self.binary(other, h, self.value / h, other.value / h)
    }

    fn sin(self) -> Self {
        self.unary(self.value.sin(), self.value.cos())
    }

    fn cos(self) -> Self {
        self.unary(self.value.cos(), -self.value.sin())
    }

    fn tan(self) -> Self {
        let t = self.value.tan();
        self.unary(t, 1.0 + t * t)
    }

    fn asin(self) -> Self {
        let v = self.value;
        self.unary(v.asin(), 1.0 / (1.0 - v * v).sqrt())
    }

    fn acos(self) -> Self {
        let v = self.value;
        self.unary(v.acos(), -1.0 / (1.0 - v * v).sqrt())
    }

    fn atan(self) -> Self {
        let v = self.value;
        self.unary(v.atan(), 1.0 / (1.0 + v * v))
    }

    fn atan2(self, other: Self) -> Self {
        let (y, x) = (self.value, other.value);
        let r2 = x * x + y * y;
        self.binary(other, y.atan2(x), x / r2, -y / r2)
    }

    fn sin_cos(self) -> (Self, Self) {
        (self.sin(), self.cos())
    }

    fn exp_m1(self) -> Self {
        self.unary(self.value.exp_m1(), self.value.exp())
    }

    fn ln_1p(self) -> Self {
        self.unary(self.value.ln_1p(), 1.0 / (1.0 + self.value))
    }

    fn sinh(self) -> Self {
        self.unary(self.value.sinh(), self.value.cosh())
    }

    fn cosh(self) -> Self {
        self.unary(self.value.cosh(), self.value.sinh())
    }

    fn tanh(self) -> Self {
        let t = self.value.tanh();
        self.unary(t, 1.0 - t * t)
    }

    fn asinh(self) -> Self {
        let v = self.value;
        self.unary(v.asinh(), 1.0 / (v * v + 1.0).sqrt())
    }

    fn acosh(self) -> Self {
        let v = self.value;
        self.unary(v.acosh(), 1.0 / (v * v - 1.0).sqrt())
    }

    fn atanh(self) -> Self {
        let v = self.value;
        self.unary(v.atanh(), 1.0 / (1.0 - v * v))
    }

    fn integer_decode(self) -> (u64, i16, i8) {
        Float::integer_decode(self.value)
    }
}
