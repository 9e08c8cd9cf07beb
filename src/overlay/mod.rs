//! Layer-on-layer geometric overlays: intersection, difference and dissolve.
//! Every operation borrows its inputs and returns a new layer.
mod difference;
mod dissolve;
mod intersection;
