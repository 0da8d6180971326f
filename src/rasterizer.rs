//! Scanline triangle rasterizer
//!
//! One fill engine covers the whole shader family: `TriangleRasterizer<A>`
//! interpolates Z plus `A` attribute slots of three lanes each, in either
//! affine or perspective-correct mode chosen per draw call. Depth-only
//! shadow passes run with `A = 0`; Gouraud runs `A = 4` (UV, color, two
//! light-space locations); Phong runs `A = 3` (UV, world position, world
//! normal).
//!
//! Corner data is copied into private slots on entry, so sorting and
//! splitting never touch the caller's vertex buffers.
//!
//! Attribute lanes are raw `i32` values at a caller-chosen scale: the
//! packer may shift small values up by `INTERPOLATE_BIT` for extra
//! precision and the fragment program shifts them back down. Affine mode
//! additionally carries every lane at `FP_BIT` extra bits internally, so
//! affine-packed lanes must stay within 16 bits of magnitude.

use serde::{Deserialize, Serialize};

use crate::fixed::{self, FP_BIT, FP_ONE};
use crate::frustum::Frustum;
use crate::vector::Vec4;

/// Extra fractional bits attribute packers may use.
pub const INTERPOLATE_BIT: u32 = 5;

/// One at `INTERPOLATE_BIT` scale; also the numerator of the 1/Z pre-pass.
pub const INTERPOLATE_ONE: i32 = 1 << INTERPOLATE_BIT;

/// Face culling direction.
///
/// A triangle is culled when its signed screen area times this sign is
/// positive, so `Back` rejects positive-area faces and `Front` rejects
/// negative-area ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CullFace {
    Back,
    Front,
    Disabled,
}

impl CullFace {
    #[inline]
    const fn sign(self) -> i64 {
        match self {
            CullFace::Back => 1,
            CullFace::Front => -1,
            CullFace::Disabled => 0,
        }
    }
}

/// Attribute interpolation mode, selected at draw-call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    /// Screen-space linear. Cheap, warps textures under depth disparity.
    Affine,
    /// Attributes premultiplied by 1/Z per corner, divided back per pixel.
    PerspectiveCorrect,
}

/// Per-pixel record handed to the fragment program. Never retained.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<const A: usize> {
    pub x: i32,
    pub y: i32,
    /// Interpolated depth at Q15 scale.
    pub z: i32,
    /// Interpolated attribute lanes at the packer's scale.
    pub attributes: [[i32; 3]; A],
}

/// Per-edge slopes for X, Z and every attribute lane.
#[derive(Clone, Copy)]
struct Edge<const A: usize> {
    dx: i32,
    dz: i32,
    da: [[i32; 3]; A],
}

/// Left-to-right gradient applied per pixel inside a scanline.
#[derive(Clone, Copy)]
struct PixelStep<const A: usize> {
    dz: i32,
    da: [[i32; 3]; A],
}

/// Scanline triangle fill engine with `A` interpolated attribute slots.
pub struct TriangleRasterizer<const A: usize> {
    port_left: i32,
    port_right: i32,
    port_top: i32,
    port_bottom: i32,
    frustum_cull: bool,
    cull_face: CullFace,
    // corner slots 0..2, slot 3 holds the synthesized split vertex
    loc: [[i32; 3]; 4],
    attr: [[[i32; 3]; 4]; A],
}

impl<const A: usize> Default for TriangleRasterizer<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const A: usize> TriangleRasterizer<A> {
    pub fn new() -> Self {
        TriangleRasterizer {
            port_left: 0,
            port_right: 0,
            port_top: 0,
            port_bottom: 0,
            frustum_cull: true,
            cull_face: CullFace::Back,
            loc: [[0; 3]; 4],
            attr: [[[0; 3]; 4]; A],
        }
    }

    /// Adopt the pixel-space bounds of a ported frustum.
    pub fn set_viewport(&mut self, frustum: &Frustum) {
        self.port_left = frustum.port_left();
        self.port_right = frustum.port_right();
        self.port_top = frustum.port_top();
        self.port_bottom = frustum.port_bottom();
    }

    /// Whole-triangle view-volume rejection. Per-pixel behavior is the
    /// fragment program's concern either way.
    pub fn set_frustum_cull(&mut self, frustum_cull: bool) {
        self.frustum_cull = frustum_cull;
    }

    pub fn set_cull_face(&mut self, cull_face: CullFace) {
        self.cull_face = cull_face;
    }

    /// Rasterize one triangle.
    ///
    /// `locations` come from the screenport: X/Y raw values are whole
    /// pixels, Z is Q15 depth. `attributes[slot][corner]` are raw lanes at
    /// the packer's scale. The fragment program runs once per covered
    /// pixel.
    pub fn draw<F: FnMut(&Fragment<A>)>(
        &mut self,
        locations: &[Vec4; 3],
        attributes: &[[[i32; 3]; 3]; A],
        interpolation: Interpolation,
        emit: &mut F,
    ) {
        for corner in 0..3 {
            self.loc[corner] = [
                locations[corner].x.raw(),
                locations[corner].y.raw(),
                locations[corner].z.raw(),
            ];
            for slot in 0..A {
                self.attr[slot][corner] = attributes[slot][corner];
            }
        }
        if self.culled() {
            return;
        }
        if interpolation == Interpolation::PerspectiveCorrect {
            self.divide_one_by_z();
        }
        self.sort_by_y();
        if self.loc[1][1] == self.loc[2][1] {
            self.flat_bottom(0, 1, 2, interpolation, emit);
        } else if self.loc[0][1] == self.loc[1][1] {
            self.flat_top(0, 1, 2, true, interpolation, emit);
        } else {
            self.split();
            self.flat_bottom(0, 1, 3, interpolation, emit);
            // the split path already drew the middle row
            self.flat_top(1, 3, 2, false, interpolation, emit);
        }
    }

    // -------------------------------------------------------------------------
    // Cull
    // -------------------------------------------------------------------------

    fn culled(&self) -> bool {
        self.larger_than_port() || self.out_of_frustum() || self.back_face()
    }

    /// Degenerate or absurdly large triangles (bad projections) are
    /// rejected before any edge math runs on them.
    fn larger_than_port(&self) -> bool {
        let width = (self.loc[0][0] - self.loc[1][0])
            .abs()
            .max((self.loc[2][0] - self.loc[1][0]).abs())
            .max((self.loc[2][0] - self.loc[0][0]).abs());
        let height = (self.loc[0][1] - self.loc[1][1])
            .abs()
            .max((self.loc[2][1] - self.loc[1][1]).abs())
            .max((self.loc[2][1] - self.loc[0][1]).abs());
        width > self.port_right - self.port_left || height > self.port_bottom - self.port_top
    }

    /// Rejects only when all three corners sit outside the volume on the
    /// same axis; partially visible triangles go through.
    fn out_of_frustum(&self) -> bool {
        if !self.frustum_cull {
            return false;
        }
        let inside_x = |c: usize| self.loc[c][0] > self.port_left && self.loc[c][0] < self.port_right;
        let inside_y = |c: usize| self.loc[c][1] > self.port_top && self.loc[c][1] < self.port_bottom;
        let inside_z = |c: usize| self.loc[c][2] > 0 && self.loc[c][2] < FP_ONE;
        (!inside_x(0) && !inside_x(1) && !inside_x(2))
            || (!inside_y(0) && !inside_y(1) && !inside_y(2))
            || (!inside_z(0) && !inside_z(1) && !inside_z(2))
    }

    fn back_face(&self) -> bool {
        let [x0, y0, _] = self.loc[0];
        let [x1, y1, _] = self.loc[1];
        let [x2, y2, _] = self.loc[2];
        let area =
            (x1 - x0) as i64 * (y2 - y0) as i64 - (x2 - x0) as i64 * (y1 - y0) as i64;
        area * self.cull_face.sign() > 0
    }

    // -------------------------------------------------------------------------
    // Sort / split
    // -------------------------------------------------------------------------

    fn swap_corners(&mut self, a: usize, b: usize) {
        self.loc.swap(a, b);
        for slot in 0..A {
            self.attr[slot].swap(a, b);
        }
    }

    fn sort_by_y(&mut self) {
        if self.loc[0][1] > self.loc[1][1] {
            self.swap_corners(0, 1);
        }
        if self.loc[1][1] > self.loc[2][1] {
            self.swap_corners(1, 2);
        }
        if self.loc[0][1] > self.loc[1][1] {
            self.swap_corners(0, 1);
        }
    }

    /// Synthesize slot 3 on the long edge at the middle vertex's height,
    /// interpolating Z and every attribute by the same parameter.
    fn split(&mut self) {
        let t = fixed::div(
            self.loc[1][1] - self.loc[0][1],
            self.loc[2][1] - self.loc[0][1],
        );
        self.loc[3][0] = self.loc[0][0] + fixed::mul(t, self.loc[2][0] - self.loc[0][0]);
        self.loc[3][1] = self.loc[1][1];
        self.loc[3][2] = self.loc[0][2] + fixed::mul(t, self.loc[2][2] - self.loc[0][2]);
        for slot in 0..A {
            for lane in 0..3 {
                self.attr[slot][3][lane] = self.attr[slot][0][lane]
                    + fixed::mul(t, self.attr[slot][2][lane] - self.attr[slot][0][lane]);
            }
        }
    }

    /// Replace corner depths with 1/Z at `INTERPOLATE_ONE` scale and
    /// premultiply every attribute lane, the perspective pre-pass.
    fn divide_one_by_z(&mut self) {
        for corner in 0..3 {
            let z = self.loc[corner][2].max(1);
            let one_by_z = fixed::div(INTERPOLATE_ONE, z);
            self.loc[corner][2] = one_by_z;
            for slot in 0..A {
                for lane in 0..3 {
                    self.attr[slot][corner][lane] =
                        fixed::mul(self.attr[slot][corner][lane], one_by_z);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Scanline walk
    // -------------------------------------------------------------------------

    /// Edge slopes from `from` down to `to` over `dy` scanlines. Affine
    /// lanes come out at FP_BIT extra scale (matching the shifted
    /// accumulators); perspective lanes stay native.
    fn edge(&self, from: usize, to: usize, dy: i32, interpolation: Interpolation) -> Edge<A> {
        let denominator = match interpolation {
            Interpolation::Affine => dy,
            Interpolation::PerspectiveCorrect => dy << FP_BIT,
        };
        let mut edge = Edge {
            dx: fixed::div(self.loc[to][0] - self.loc[from][0], dy),
            dz: fixed::div(self.loc[to][2] - self.loc[from][2], denominator),
            da: [[0; 3]; A],
        };
        for slot in 0..A {
            for lane in 0..3 {
                edge.da[slot][lane] = fixed::div(
                    self.attr[slot][to][lane] - self.attr[slot][from][lane],
                    denominator,
                );
            }
        }
        edge
    }

    /// Left-to-right gradient between two edges; the same formula serves
    /// both triangle halves.
    fn pixel_step(lo: &Edge<A>, hi: &Edge<A>) -> PixelStep<A> {
        let dxdx = guard_zero(hi.dx - lo.dx);
        let mut step = PixelStep {
            dz: fixed::div(hi.dz - lo.dz, dxdx),
            da: [[0; 3]; A],
        };
        for slot in 0..A {
            for lane in 0..3 {
                step.da[slot][lane] = fixed::div(hi.da[slot][lane] - lo.da[slot][lane], dxdx);
            }
        }
        step
    }

    fn start_values(&self, corner: usize, interpolation: Interpolation) -> (i32, [[i32; 3]; A]) {
        let mut attrs = [[0; 3]; A];
        match interpolation {
            Interpolation::Affine => {
                for slot in 0..A {
                    for lane in 0..3 {
                        attrs[slot][lane] = self.attr[slot][corner][lane] << FP_BIT;
                    }
                }
                (self.loc[corner][2] << FP_BIT, attrs)
            }
            Interpolation::PerspectiveCorrect => {
                for slot in 0..A {
                    attrs[slot] = self.attr[slot][corner];
                }
                (self.loc[corner][2], attrs)
            }
        }
    }

    fn flat_bottom<F: FnMut(&Fragment<A>)>(
        &mut self,
        apex: usize,
        base1: usize,
        base2: usize,
        interpolation: Interpolation,
        emit: &mut F,
    ) {
        let dy = guard_zero(self.loc[base1][1] - self.loc[apex][1]);
        let edge1 = self.edge(apex, base1, dy, interpolation);
        let edge2 = self.edge(apex, base2, dy, interpolation);
        let (lo, hi) = if edge1.dx <= edge2.dx { (edge1, edge2) } else { (edge2, edge1) };
        let step = Self::pixel_step(&lo, &hi);

        let x_start = self.loc[apex][0] << FP_BIT;
        let (mut z, mut attrs) = self.start_values(apex, interpolation);
        let mut x1 = x_start;
        let mut x2 = x_start;
        for y in self.loc[apex][1]..=self.loc[base1][1] {
            self.scanline(x1, x2, y, z, &attrs, &step, interpolation, emit);
            x1 += lo.dx;
            x2 += hi.dx;
            z += lo.dz;
            for slot in 0..A {
                for lane in 0..3 {
                    attrs[slot][lane] += lo.da[slot][lane];
                }
            }
        }
    }

    fn flat_top<F: FnMut(&Fragment<A>)>(
        &mut self,
        top1: usize,
        top2: usize,
        bottom: usize,
        include_top_row: bool,
        interpolation: Interpolation,
        emit: &mut F,
    ) {
        let dy1 = guard_zero(self.loc[bottom][1] - self.loc[top1][1]);
        let dy2 = guard_zero(self.loc[bottom][1] - self.loc[top2][1]);
        let edge1 = self.edge(top1, bottom, dy1, interpolation);
        let edge2 = self.edge(top2, bottom, dy2, interpolation);
        // walking upward the steeper slope tracks the left side
        let (lo, hi) = if edge1.dx > edge2.dx { (edge2, edge1) } else { (edge1, edge2) };
        let step = Self::pixel_step(&lo, &hi);

        let x_start = self.loc[bottom][0] << FP_BIT;
        let (mut z, mut attrs) = self.start_values(bottom, interpolation);
        let mut x1 = x_start;
        let mut x2 = x_start;
        let y_limit = self.loc[top1][1] + if include_top_row { 0 } else { 1 };
        let mut y = self.loc[bottom][1];
        while y >= y_limit {
            self.scanline(x1, x2, y, z, &attrs, &step, interpolation, emit);
            x1 -= hi.dx;
            x2 -= lo.dx;
            z -= hi.dz;
            for slot in 0..A {
                for lane in 0..3 {
                    attrs[slot][lane] -= hi.da[slot][lane];
                }
            }
            y -= 1;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn scanline<F: FnMut(&Fragment<A>)>(
        &self,
        x1: i32,
        x2: i32,
        y: i32,
        z_start: i32,
        attr_start: &[[i32; 3]; A],
        step: &PixelStep<A>,
        interpolation: Interpolation,
        emit: &mut F,
    ) {
        let start = x1 >> FP_BIT;
        let end = x2 >> FP_BIT;
        let mut z = z_start;
        let mut attrs = *attr_start;
        let mut fragment = Fragment { x: start, y, z: 0, attributes: [[0; 3]; A] };
        for x in start..=end {
            fragment.x = x;
            match interpolation {
                Interpolation::Affine => {
                    fragment.z = z >> FP_BIT;
                    for slot in 0..A {
                        for lane in 0..3 {
                            fragment.attributes[slot][lane] = attrs[slot][lane] >> FP_BIT;
                        }
                    }
                }
                Interpolation::PerspectiveCorrect => {
                    let one_by_z = fixed::div(FP_ONE << INTERPOLATE_BIT, z.max(1));
                    fragment.z = one_by_z >> FP_BIT;
                    for slot in 0..A {
                        for lane in 0..3 {
                            fragment.attributes[slot][lane] =
                                fixed::mul(attrs[slot][lane], one_by_z) >> INTERPOLATE_BIT;
                        }
                    }
                }
            }
            emit(&fragment);
            z += step.dz;
            for slot in 0..A {
                for lane in 0..3 {
                    attrs[slot][lane] += step.da[slot][lane];
                }
            }
        }
    }
}

/// Zero denominators become one: degenerate spans collapse silently
/// instead of dividing by zero.
#[inline]
const fn guard_zero(value: i32) -> i32 {
    if value == 0 {
        1
    } else {
        value
    }
}
