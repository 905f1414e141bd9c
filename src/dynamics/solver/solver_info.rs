use crate::math::Real;

bitflags::bitflags! {
    /// Flags selecting optional behaviors of the sequential impulse solver.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct SolverMode: u32 {
        /// Shuffle the constraint order every eight iterations.
        const RANDOMIZE_ORDER = 1;
        /// Start from a fraction of the impulses of the previous step.
        const USE_WARMSTARTING = 1 << 2;
        /// Apply friction along two lateral directions instead of one.
        const USE_2_FRICTION_DIRECTIONS = 1 << 4;
        /// Reuse the friction directions stored in the contact points.
        const ENABLE_FRICTION_DIRECTION_CACHING = 1 << 5;
        /// Never derive the friction directions from the relative velocity.
        const DISABLE_VELOCITY_DEPENDENT_FRICTION_DIRECTION = 1 << 6;
        /// Use the batched row solver when available.
        const SIMD = 1 << 8;
        /// Solve the friction of each contact right after its normal constraint.
        const INTERLEAVE_CONTACT_AND_FRICTION_CONSTRAINTS = 1 << 9;
    }
}

impl Default for SolverMode {
    fn default() -> Self {
        SolverMode::USE_WARMSTARTING | SolverMode::SIMD | SolverMode::USE_2_FRICTION_DIRECTIONS
    }
}

/// Parameters of one constraint solve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolverInfo {
    /// The length of the simulation step.
    pub time_step: Real,
    /// The number of Gauss-Seidel iterations.
    pub num_iterations: usize,
    /// Scale of the relative velocity removed by joint rows.
    pub damping: Real,
    /// Successive over-relaxation factor of contact rows.
    pub sor: Real,
    /// Error reduction of joints and of shallow contacts.
    pub erp: Real,
    /// Error reduction of deep contacts, corrected through split impulse.
    pub erp2: Real,
    /// Constraint force mixing applied to every row.
    pub global_cfm: Real,
    /// Correct deep penetrations with pseudo-velocities that do not add energy.
    pub split_impulse: bool,
    /// Contacts deeper than this (negative) distance use split impulse.
    pub split_impulse_penetration_threshold: Real,
    /// Fraction of the split-impulse turn velocity integrated into orientations.
    pub split_impulse_turn_erp: Real,
    /// Distance added to every contact distance.
    pub linear_slop: Real,
    /// Fraction of the previous impulses used to warm-start the solver.
    pub warmstarting_factor: Real,
    /// Optional solver behaviors.
    pub solver_mode: SolverMode,
    /// Contacts older than this number of steps never bounce.
    pub resting_contact_restitution_threshold: u32,
    /// Iterations stop once the largest squared residual falls below this value.
    pub least_squares_residual_threshold: Real,
    /// Approach speeds below this value never bounce.
    pub restitution_velocity_threshold: Real,
}

impl Default for SolverInfo {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            num_iterations: 10,
            damping: 1.0,
            sor: 1.0,
            erp: 0.2,
            erp2: 0.8,
            global_cfm: 0.0,
            split_impulse: true,
            split_impulse_penetration_threshold: -0.04,
            split_impulse_turn_erp: 0.1,
            linear_slop: 0.0,
            warmstarting_factor: 0.85,
            solver_mode: SolverMode::default(),
            resting_contact_restitution_threshold: 2,
            least_squares_residual_threshold: 0.0,
            restitution_velocity_threshold: 0.2,
        }
    }
}
