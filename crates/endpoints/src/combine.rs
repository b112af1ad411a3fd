//! Merging independently decoded request fragments into one value.
//!
//! An endpoint decodes its url, body and headers separately and merges them with two
//! [`Combiner`]s, always in the same order:
//!
//! ```text
//! combine(combine(url, body), headers)
//! ```
//!
//! Reverse routing and the client split the value back with the same two combiners, in the
//! opposite order. Combiners are plain values picked by whoever writes the endpoint description:
//!
//! - [`Tupled`] keeps both sides as a pair,
//! - [`UnitLeft`] / [`UnitRight`] drop a `()` fragment so an endpoint without headers or
//!   without a body keeps the type of the fragments that do carry information.
//!
//! # Example
//! ```
//! use micro_endpoints::combine::{Combiner, Tupled, UnitLeft, UnitRight};
//!
//! assert_eq!(UnitLeft.combine((), 7), 7);
//! assert_eq!(UnitRight.combine("id", ()), "id");
//!
//! let pair = Tupled.combine(1, "one");
//! assert_eq!(Tupled.split(pair), (1, "one"));
//! ```

/// Merges `A` and `B` into `Out`, and splits `Out` back.
///
/// Implementations must satisfy `split(combine(a, b)) == (a, b)`.
pub trait Combiner<A, B>: Send + Sync {
    type Out;

    fn combine(&self, a: A, b: B) -> Self::Out;

    fn split(&self, out: Self::Out) -> (A, B);
}

/// Keeps both fragments as an ordered pair, `(A, B)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tupled;

impl<A, B> Combiner<A, B> for Tupled {
    type Out = (A, B);

    #[inline]
    fn combine(&self, a: A, b: B) -> Self::Out {
        (a, b)
    }

    #[inline]
    fn split(&self, out: Self::Out) -> (A, B) {
        out
    }
}

/// Absorbs a unit on the left: `((), B) -> B`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitLeft;

impl<B> Combiner<(), B> for UnitLeft {
    type Out = B;

    #[inline]
    fn combine(&self, _a: (), b: B) -> Self::Out {
        b
    }

    #[inline]
    fn split(&self, out: Self::Out) -> ((), B) {
        ((), out)
    }
}

/// Absorbs a unit on the right: `(A, ()) -> A`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitRight;

impl<A> Combiner<A, ()> for UnitRight {
    type Out = A;

    #[inline]
    fn combine(&self, a: A, _b: ()) -> Self::Out {
        a
    }

    #[inline]
    fn split(&self, out: Self::Out) -> (A, ()) {
        (out, ())
    }
}

/// A pair of functions mapping `A` to `B` and back.
///
/// Used to expose a domain type from an endpoint instead of the nested tuples produced by
/// [`Tupled`]. `backward(forward(a)) == a` must hold for every `a` the endpoint can decode.
#[derive(Debug, Clone, Copy)]
pub struct Transform<F, G> {
    forward: F,
    backward: G,
}

impl<F, G> Transform<F, G> {
    pub fn new(forward: F, backward: G) -> Self {
        Self { forward, backward }
    }

    #[inline]
    pub fn forward<A, B>(&self, a: A) -> B
    where
        F: Fn(A) -> B,
    {
        (self.forward)(a)
    }

    #[inline]
    pub fn backward<A, B>(&self, b: B) -> A
    where
        G: Fn(B) -> A,
    {
        (self.backward)(b)
    }
}
