//! Geometry kernel: stateless queries on rays, planes, spheres, cubes and triangles.
//!
//! Nothing here validates its input. Degenerate configurations (parallel
//! rays, zero-area triangles) come back as `None`/`false`, or as a
//! well-defined but meaningless number where the signature has no room for
//! absence. Callers treat both as "no interaction".

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use glam::{DQuat, DVec3, EulerRot};

use crate::consts::{LINE_EPSILON, PARALLEL_EPSILON};

/// A half-line from `origin` along `dir`. Most queries assume `dir` is normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub dir: DVec3,
}

impl Ray {
    #[must_use]
    pub fn new(origin: DVec3, dir: DVec3) -> Self {
        Self { origin, dir }
    }

    /// Point at parameter `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.dir * t
    }
}

/// Ray/triangle intersection point and the triangle's unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub point: DVec3,
    pub normal: DVec3,
}

/// Barycentric weights of a point with respect to triangle `(a, b, c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bary {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Closest approach between two lines: `p0` lies on the first, `p1` on the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Closest {
    pub p0: DVec3,
    pub p1: DVec3,
    /// Parameter of `p0` along the first line's direction.
    pub s: f64,
    /// Parameter of `p1` along the second line's direction.
    pub t: f64,
}

/// Intersect a ray with the plane through `point` with normal `normal`.
///
/// The result is returned even when `t` is negative. A ray parallel to the
/// plane divides by zero and yields non-finite components; avoiding that is
/// the caller's job.
#[must_use]
pub fn intersect_plane(ray: &Ray, normal: DVec3, point: DVec3) -> DVec3 {
    let d = -normal.dot(point);
    let t = -(ray.origin.dot(normal) + d) / ray.dir.dot(normal);
    ray.at(t)
}

/// Whether the line through `ray` passes within `radius` of `center`.
///
/// Tests the infinite line: spheres behind the origin also count.
#[must_use]
pub fn intersect_sphere(ray: &Ray, center: DVec3, radius: f64) -> bool {
    ray.dir.cross(center - ray.origin).length() <= radius
}

/// Slab test of a ray against the axis-aligned cube of edge `edge` centered at `center`.
#[must_use]
pub fn intersect_cube(ray: &Ray, center: DVec3, edge: f64) -> bool {
    let half = DVec3::splat(edge / 2.0);
    let min = center - half;
    let max = center + half;

    let mut tmin = f64::NEG_INFINITY;
    let mut tmax = f64::INFINITY;
    for axis in 0..3 {
        let div = 1.0 / ray.dir[axis];
        let (lo, hi) = if div >= 0.0 {
            ((min[axis] - ray.origin[axis]) * div, (max[axis] - ray.origin[axis]) * div)
        } else {
            ((max[axis] - ray.origin[axis]) * div, (min[axis] - ray.origin[axis]) * div)
        };
        if tmin > hi || lo > tmax {
            return false;
        }
        tmin = tmin.max(lo);
        tmax = tmax.min(hi);
    }

    tmin <= tmax && tmax > 0.0
}

/// Intersect a ray with triangle `(p0, p1, p2)`.
///
/// Rejects rays nearly parallel to the plane, hits behind the origin and
/// points outside the triangle.
#[must_use]
pub fn intersect_triangle(ray: &Ray, p0: DVec3, p1: DVec3, p2: DVec3) -> Option<TriangleHit> {
    let u = p1 - p0;
    let v = p2 - p0;
    let n = u.cross(v);

    let denom = n.dot(ray.dir);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = n.dot(p0 - ray.origin) / denom;
    if t < 0.0 {
        return None;
    }
    let point = ray.at(t);

    let w = point - p0;
    let uu = u.dot(u);
    let uv = u.dot(v);
    let vv = v.dot(v);
    let wu = w.dot(u);
    let wv = w.dot(v);
    let det = uv * uv - uu * vv;
    if det.abs() < LINE_EPSILON {
        return None;
    }

    let s = (uv * wv - vv * wu) / det;
    if !(0.0..=1.0).contains(&s) {
        return None;
    }
    let r = (uv * wu - uu * wv) / det;
    if r < 0.0 || s + r > 1.0 {
        return None;
    }

    Some(TriangleHit { point, normal: n.normalize() })
}

/// Barycentric weights of the point where `ray` meets the plane of `(a, b, c)`.
///
/// Each weight is the signed area of the opposite sub-triangle over the full
/// area. The point is not required to lie inside the triangle; weights
/// outside `[0, 1]` say it does not.
#[must_use]
pub fn intersect_triangle_bary(ray: &Ray, a: DVec3, b: DVec3, c: DVec3) -> Option<Bary> {
    let n = (b - a).cross(c - a);
    let area = n.dot(n);
    if area < LINE_EPSILON || n.dot(ray.dir).abs() < PARALLEL_EPSILON {
        return None;
    }
    let p = intersect_plane(ray, n, a);

    let alpha = (c - b).cross(p - b).dot(n) / area;
    let beta = (a - c).cross(p - c).dot(n) / area;
    let gamma = (b - a).cross(p - a).dot(n) / area;
    Some(Bary { alpha, beta, gamma })
}

#[must_use]
pub fn get_centroid(a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    (a + b + c) / 3.0
}

/// Closest approach of the lines through `a` and `b`. `None` when they are parallel.
#[must_use]
pub fn get_closest(a: &Ray, b: &Ray) -> Option<Closest> {
    let w0 = a.origin - b.origin;
    let aa = a.dir.dot(a.dir);
    let ab = a.dir.dot(b.dir);
    let bb = b.dir.dot(b.dir);
    let d = a.dir.dot(w0);
    let e = b.dir.dot(w0);

    let denom = aa * bb - ab * ab;
    if denom.abs() < LINE_EPSILON {
        return None;
    }

    let s = (ab * e - bb * d) / denom;
    let t = (aa * e - ab * d) / denom;
    Some(Closest { p0: a.at(s), p1: b.at(t), s, t })
}

/// Distance from `point` to the line through `ray`.
#[must_use]
pub fn get_distance(point: DVec3, ray: &Ray) -> f64 {
    let len = ray.dir.length();
    if len < LINE_EPSILON {
        return point.distance(ray.origin);
    }
    (point - ray.origin).cross(ray.dir).length() / len
}

/// Quaternion for Euler angles `(x, y, z)` in radians, composed Z then Y then X.
#[must_use]
pub fn quat_from_euler_angles(x: f64, y: f64, z: f64) -> DQuat {
    DQuat::from_euler(EulerRot::ZYX, z, y, x).normalize()
}

/// Closest point of segment `[a, b]` to the ray, and its distance from the ray line.
///
/// Returns `None` when the segment is degenerate or parallel to the ray, or
/// when the closest point lies behind the ray origin.
#[must_use]
pub fn closest_on_segment(ray: &Ray, a: DVec3, b: DVec3) -> Option<(DVec3, f64)> {
    let segment = Ray::new(a, b - a);
    let closest = get_closest(ray, &segment)?;
    let point = segment.at(closest.t.clamp(0.0, 1.0));
    if (point - ray.origin).dot(ray.dir) < 0.0 {
        return None;
    }
    Some((point, get_distance(point, ray)))
}
