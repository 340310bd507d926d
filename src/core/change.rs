use std::ops::Add;
use std::ops::Mul;
use std::ops::Sub;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Change<T>
where
    T: Add<Output = T> + Sub<Output = T> + Mul<Output = T>,
{
    Inc(T),
    Dec(T),
}

impl<T> Change<T>
where
    T: Add<Output = T> + Sub<Output = T> + Mul<Output = T>,
{
    /// The same magnitude in the opposite direction.
    pub fn rev(self) -> Self {
        match self {
            Change::Inc(delta) => Change::Dec(delta),
            Change::Dec(delta) => Change::Inc(delta),
        }
    }
}
