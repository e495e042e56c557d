//! Fixed-step fourth-order Runge-Kutta for 2-component ODE systems.
//!
//! The field-line equations advance (x, z) with the toroidal angle as
//! the independent variable; stepping is kept generic over the
//! right-hand side so the integrator carries no domain state.

/// One RK4 step of dy/dt = f(t, y) for a 2-component state.
pub fn rk4_step<F>(f: &F, t: f64, y: [f64; 2], dt: f64) -> [f64; 2]
where
    F: Fn(f64, [f64; 2]) -> [f64; 2],
{
    let k1 = f(t, y);
    let k2 = f(
        t + 0.5 * dt,
        [y[0] + 0.5 * dt * k1[0], y[1] + 0.5 * dt * k1[1]],
    );
    let k3 = f(
        t + 0.5 * dt,
        [y[0] + 0.5 * dt * k2[0], y[1] + 0.5 * dt * k2[1]],
    );
    let k4 = f(t + dt, [y[0] + dt * k3[0], y[1] + dt * k3[1]]);
    [
        y[0] + dt * (k1[0] + 2.0 * k2[0] + 2.0 * k3[0] + k4[0]) / 6.0,
        y[1] + dt * (k1[1] + 2.0 * k2[1] + 2.0 * k3[1] + k4[1]) / 6.0,
    ]
}

/// Integrate from `t0` across `span` (signed) in `steps` equal RK4
/// substeps. Zero steps is a no-op returning the initial state.
pub fn integrate_interval<F>(f: &F, t0: f64, y0: [f64; 2], span: f64, steps: usize) -> [f64; 2]
where
    F: Fn(f64, [f64; 2]) -> [f64; 2],
{
    if steps == 0 {
        return y0;
    }
    let dt = span / steps as f64;
    let mut y = y0;
    let mut t = t0;
    for _ in 0..steps {
        y = rk4_step(f, t, y, dt);
        t += dt;
    }
    y
}
