use approx::{AbsDiffEq, RelativeEq};
use core::fmt::{Debug, Display};
use std::str::FromStr;

/// Radian unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct URadian;

/// Degree unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UDegree;

/// Unit trait for angle units.
pub trait AngleUnit: Debug + Copy + Clone {
    /// The name of the unit.
    const NAME: &'static str;

    /// The symbols of the unit, the first one is used for printing.
    const SYMBOLS: &'static [&'static str];

    /// The conversion factor from radians.
    const FACTOR_FROM_RAD: f32;

    /// The conversion factor to radians.
    const FACTOR_TO_RAD: f32 = 1.0 / Self::FACTOR_FROM_RAD;

    /// The conversion factor from degrees.
    const FACTOR_FROM_DEG: f32;

    /// The conversion factor to degrees.
    const FACTOR_TO_DEG: f32 = 1.0 / Self::FACTOR_FROM_DEG;
}

impl AngleUnit for URadian {
    const NAME: &'static str = "radian";
    const SYMBOLS: &'static [&'static str] = &["rad", "rads", "radians"];
    const FACTOR_FROM_RAD: f32 = 1.0;
    const FACTOR_FROM_DEG: f32 = std::f32::consts::PI / 180.0;
}

impl AngleUnit for UDegree {
    const NAME: &'static str = "degree";
    const SYMBOLS: &'static [&'static str] = &["deg", "degs", "degrees", "°"];
    const FACTOR_FROM_RAD: f32 = 180.0 / std::f32::consts::PI;
    const FACTOR_FROM_DEG: f32 = 1.0;
}

/// Angle with unit.
#[derive(Copy, Clone)]
pub struct Angle<A: AngleUnit> {
    pub(crate) value: f32,
    pub(crate) unit: core::marker::PhantomData<A>,
}

impl<A: AngleUnit> Debug for Angle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Angle {{ value: {}, unit: {} }}",
            self.value,
            A::SYMBOLS[0]
        )
    }
}

impl<A: AngleUnit> Display for Angle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, A::SYMBOLS[0])
    }
}

impl<A: AngleUnit> Default for Angle<A> {
    fn default() -> Self { Self::ZERO }
}

impl<A: AngleUnit> PartialEq for Angle<A> {
    fn eq(&self, other: &Self) -> bool { self.value == other.value }
}

impl<A: AngleUnit> PartialOrd for Angle<A> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<A: AngleUnit> AbsDiffEq for Angle<A> {
    type Epsilon = f32;

    fn default_epsilon() -> Self::Epsilon { f32::default_epsilon() }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.value.abs_diff_eq(&other.value, epsilon)
    }
}

impl<A: AngleUnit> RelativeEq for Angle<A> {
    fn default_max_relative() -> Self::Epsilon { f32::default_max_relative() }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.value.relative_eq(&other.value, epsilon, max_relative)
    }
}

impl<A: AngleUnit> Angle<A> {
    /// Zero angle.
    pub const ZERO: Self = Self::new(0.0);

    /// Create a new angle with unit.
    pub const fn new(value: f32) -> Self {
        Angle {
            value,
            unit: core::marker::PhantomData,
        }
    }

    /// Get the value of the angle.
    pub const fn value(&self) -> f32 { self.value }

    /// Determines whether the angle is greater than zero.
    #[inline(always)]
    pub fn is_positive(&self) -> bool { self.value > 0.0 }

    /// Returns the maximum of the two angles.
    pub fn max(self, other: Self) -> Self { Self::new(self.value.max(other.value)) }

    /// Prints the angle in human readable format in degrees.
    #[inline]
    pub fn prettified(&self) -> String {
        format!("{}{}", self.value * A::FACTOR_TO_DEG, UDegree::SYMBOLS[3])
    }

    /// Converts the angle to radians.
    #[inline]
    pub fn to_radians(&self) -> Radians { Angle::new(self.value * A::FACTOR_TO_RAD) }

    /// Converts the angle to degrees.
    #[inline]
    pub fn to_degrees(&self) -> Degrees { Angle::new(self.value * A::FACTOR_TO_DEG) }

    /// Computes the sine of the angle.
    pub fn sin(&self) -> f32 { (self.value * A::FACTOR_TO_RAD).sin() }

    /// Computes the cosine of the angle.
    pub fn cos(&self) -> f32 { (self.value * A::FACTOR_TO_RAD).cos() }
}

impl From<Degrees> for Radians {
    fn from(angle: Degrees) -> Self { angle.to_radians() }
}

impl From<Radians> for Degrees {
    fn from(angle: Radians) -> Self { angle.to_degrees() }
}

impl<'a, A: AngleUnit> TryFrom<&'a str> for Angle<A> {
    type Error = &'static str;

    /// Parses strings like `30deg`, `0.5 rad` or a bare number, which is
    /// interpreted in degrees.
    fn try_from(s: &'a str) -> Result<Self, Self::Error> {
        let bytes = s.trim().as_bytes();
        let (number, unit) = match super::find_unit_start(bytes) {
            Some(i) => (&bytes[..i], &bytes[i..]),
            None => (bytes, "deg".as_bytes()),
        };
        let value = std::str::from_utf8(number)
            .map_err(|_| "invalid angle string")?
            .trim()
            .parse::<f32>()
            .map_err(|_| "invalid angle value")?;
        let unit = std::str::from_utf8(unit)
            .map_err(|_| "invalid angle unit")?
            .trim();
        if URadian::SYMBOLS.contains(&unit) {
            Ok(Self::new(A::FACTOR_FROM_RAD * value))
        } else if UDegree::SYMBOLS.contains(&unit) {
            Ok(Self::new(A::FACTOR_FROM_DEG * value))
        } else {
            Err("invalid angle unit")
        }
    }
}

impl<A: AngleUnit> FromStr for Angle<A> {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::try_from(s) }
}

impl<A: AngleUnit> serde::Serialize for Angle<A> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{}", self))
    }
}

impl<'de, A: AngleUnit> serde::Deserialize<'de> for Angle<A> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct AngleVisitor<T>(core::marker::PhantomData<T>);

        impl<'de, T: AngleUnit> serde::de::Visitor<'de> for AngleVisitor<T> {
            type Value = Angle<T>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(
                    formatter,
                    "a number of degrees or a string containing a number and a unit of angle"
                )
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Angle::<T>::try_from(v).map_err(E::custom)
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Angle::new(T::FACTOR_FROM_DEG * v as f32))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_f64(v as f64)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_f64(v as f64)
            }
        }

        deserializer.deserialize_any(AngleVisitor::<A>(core::marker::PhantomData))
    }
}

impl<A: AngleUnit> core::ops::Add for Angle<A> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output { Self::new(self.value + rhs.value) }
}

impl<A: AngleUnit> core::ops::Sub for Angle<A> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output { Self::new(self.value - rhs.value) }
}

impl<A: AngleUnit> core::ops::AddAssign for Angle<A> {
    fn add_assign(&mut self, rhs: Self) { self.value += rhs.value; }
}

impl<A: AngleUnit> core::ops::SubAssign for Angle<A> {
    fn sub_assign(&mut self, rhs: Self) { self.value -= rhs.value; }
}

impl<A: AngleUnit> core::ops::Mul<f32> for Angle<A> {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output { Self::new(self.value * rhs) }
}

impl<A: AngleUnit> core::ops::Mul<Angle<A>> for f32 {
    type Output = Angle<A>;

    fn mul(self, rhs: Angle<A>) -> Self::Output { Angle::new(self * rhs.value) }
}

impl<A: AngleUnit> core::ops::Div<f32> for Angle<A> {
    type Output = Self;

    fn div(self, rhs: f32) -> Self::Output { Self::new(self.value / rhs) }
}

impl<A: AngleUnit> core::ops::Div for Angle<A> {
    type Output = f32;

    fn div(self, rhs: Self) -> Self::Output { self.value / rhs.value }
}

impl<A: AngleUnit> core::ops::Neg for Angle<A> {
    type Output = Self;

    fn neg(self) -> Self::Output { Self::new(-self.value) }
}

/// Type alias for `Angle<URadian>`.
pub type Radians = Angle<URadian>;

/// Type alias for `Angle<UDegree>`.
pub type Degrees = Angle<UDegree>;

/// Helper creating a new `Angle<UDegree>`.
#[macro_export]
macro_rules! deg {
    ($value:expr) => {
        $crate::units::Angle::<$crate::units::UDegree>::new($value)
    };
}
