// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners.  The kernel walks pixels; the iteration happens on points.

use failure::Fail;
use num::Complex;

/// Describes the width and height of an integral plane that is assumed
/// to start at 0,0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub u32, pub u32);

/// Describes the two corners of the complex plane, treating the real
/// part of each value as the x-component and the imaginary part as
/// the y-component.  The first corner is where pixel 0,0 lands.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

/// The column and row of a pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub u32, pub u32);

/// Reasons a pair of planes cannot be mapped onto each other.
#[derive(Debug, Fail, PartialEq)]
pub enum PlaneError {
    /// The integral plane has no pixels.
    #[fail(display = "The integral plane {}x{} is empty", _0, _1)]
    Empty(u32, u32),
    /// The corners of the complex plane are not ordered.
    #[fail(display = "The first corner is not left of and above the second corner")]
    Inverted,
}

/// Maps pixels of the integral plane onto points of the complex plane.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    /// Width and height of the integral plane.
    pub integral_plane: IntegralPlane,
    /// The two corners of the complex plane.
    pub complex_plane: ComplexPlane,
    // Width and height of the complex region.
    extent: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the two
    /// corners of the complex plane.
    pub fn new(
        width: u32,
        height: u32,
        origin: Complex<f64>,
        far: Complex<f64>,
    ) -> Result<PlaneMapper, PlaneError> {
        if width == 0 || height == 0 {
            return Err(PlaneError::Empty(width, height));
        }
        if far.re <= origin.re || far.im <= origin.im {
            return Err(PlaneError::Inverted);
        }

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            complex_plane: ComplexPlane(origin, far),
            extent: (far.re - origin.re, far.im - origin.im),
        })
    }

    /// The classic Mandelbrot window, -2.5..1.0 by -1.0..1.0.
    pub fn mandelbrot(width: u32, height: u32) -> Result<PlaneMapper, PlaneError> {
        PlaneMapper::new(
            width,
            height,
            Complex::new(-2.5, -1.0),
            Complex::new(1.0, 1.0),
        )
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.integral_plane.0 as usize * self.integral_plane.1 as usize
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Given a pixel on the integral cartesian plane, map it to the
    /// corresponding point on the complex cartesian plane.
    pub fn pixel_to_point(&self, pixel: Pixel) -> Complex<f64> {
        Complex::new(
            f64::from(pixel.0) * self.extent.0 / f64::from(self.integral_plane.0)
                + self.complex_plane.0.re,
            f64::from(pixel.1) * self.extent.1 / f64::from(self.integral_plane.1)
                + self.complex_plane.0.im,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planemapper_fails_on_bad_shape() {
        let pm = PlaneMapper::new(4, 4, Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0));
        assert_eq!(pm.unwrap_err(), PlaneError::Inverted);
    }

    #[test]
    fn planemapper_fails_on_empty_plane() {
        let pm = PlaneMapper::new(0, 4, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0));
        assert_eq!(pm.unwrap_err(), PlaneError::Empty(0, 4));
    }

    #[test]
    fn planemapper_passes_on_good_shape() {
        let pm = PlaneMapper::new(4, 4, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0));
        assert!(pm.is_ok());
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let pm = PlaneMapper::new(5, 5, Complex::new(0.0, 0.0), Complex::new(5.0, 5.0)).unwrap();
        assert_eq!(pm.pixel_to_point(Pixel(0, 0)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(Pixel(2, 2)), Complex::new(2.0, 2.0));
        assert_eq!(pm.pixel_to_point(Pixel(4, 4)), Complex::new(4.0, 4.0));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let pm = PlaneMapper::new(4, 4, Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0)).unwrap();
        assert_eq!(pm.pixel_to_point(Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(Pixel(4, 4)), Complex::new(2.0, 2.0));
    }

    #[test]
    fn mandelbrot_window_starts_at_its_corner() {
        let pm = PlaneMapper::mandelbrot(1920, 1080).unwrap();
        assert_eq!(pm.len(), 1920 * 1080);
        assert_eq!(pm.pixel_to_point(Pixel(0, 0)), Complex::new(-2.5, -1.0));
        assert_eq!(pm.pixel_to_point(Pixel(1920, 1080)), Complex::new(1.0, 1.0));
    }
}
