// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! Definite triple integrals in cartesian, cylindrical and spherical coordinates.
//!
//! The function text is parsed, rewritten in the native variables of the coordinate system,
//! multiplied by the Jacobian and integrated one variable at a time in closed form. When the
//! closed form cannot be found (or the time ceiling is hit) the same integrand goes to nested
//! adaptive Gauss-Kronrod quadrature. A sampler produces plotting data for the integrand.
pub mod Utils;
pub mod errors;
pub mod numerical;
pub mod symbolic;
