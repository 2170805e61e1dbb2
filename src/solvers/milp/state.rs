//! MILP State

use std::fmt;

use good_lp::{Expression, ProblemVariables, Variable, variable};
use smallvec::SmallVec;

/// Relation operator for a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintRelation {
    /// Equality (`lhs == rhs`)
    Eq,

    /// Less than or equal (`lhs <= rhs`)
    Leq,

    /// Greater than or equal (`lhs >= rhs`)
    Geq,
}

impl ConstraintRelation {
    /// Operator symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Leq => "<=",
            Self::Geq => ">=",
        }
    }
}

/// Which rule of the packing model a constraint expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Box counts add up to the shipment box count.
    BoxTotal,

    /// Category weights add up to the shipment weight.
    WeightTotal,

    /// Declared value covers the value-density floor.
    ValueFloor,

    /// Duty stays under the duty-density ceiling.
    TaxCeiling,

    /// The required number of categories is selected.
    CategoryCount,

    /// A selected category ships at least the minimum order size.
    SelectionLower(usize),

    /// An unselected category ships nothing.
    SelectionUpper(usize),

    /// A category weighs at least its lightest boxes.
    WeightLower(usize),

    /// A category weighs at most its heaviest boxes.
    WeightUpper(usize),
}

impl ConstraintKind {
    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::BoxTotal => "box_total",
            Self::WeightTotal => "weight_total",
            Self::ValueFloor => "value_floor",
            Self::TaxCeiling => "tax_ceiling",
            Self::CategoryCount => "category_count",
            Self::SelectionLower(_) => "selection_lower",
            Self::SelectionUpper(_) => "selection_upper",
            Self::WeightLower(_) => "weight_lower",
            Self::WeightUpper(_) => "weight_upper",
        }
    }

    /// Category the constraint belongs to, if it is a per-category rule.
    pub fn category(self) -> Option<usize> {
        match self {
            Self::SelectionLower(idx)
            | Self::SelectionUpper(idx)
            | Self::WeightLower(idx)
            | Self::WeightUpper(idx) => Some(idx),
            Self::BoxTotal
            | Self::WeightTotal
            | Self::ValueFloor
            | Self::TaxCeiling
            | Self::CategoryCount => None,
        }
    }
}

/// Recorded linear constraint emitted during model construction.
#[derive(Debug, Clone)]
pub struct ModelConstraint {
    /// Rule the constraint expresses
    pub kind: ConstraintKind,

    /// Left-hand side expression
    pub lhs: Expression,

    /// Relation operator
    pub relation: ConstraintRelation,

    /// Right-hand side scalar
    pub rhs: f64,
}

impl ModelConstraint {
    /// `lhs == rhs`
    pub fn eq(kind: ConstraintKind, lhs: Expression, rhs: f64) -> Self {
        Self::new(kind, lhs, ConstraintRelation::Eq, rhs)
    }

    /// `lhs <= rhs`
    pub fn leq(kind: ConstraintKind, lhs: Expression, rhs: f64) -> Self {
        Self::new(kind, lhs, ConstraintRelation::Leq, rhs)
    }

    /// `lhs >= rhs`
    pub fn geq(kind: ConstraintKind, lhs: Expression, rhs: f64) -> Self {
        Self::new(kind, lhs, ConstraintRelation::Geq, rhs)
    }

    fn new(kind: ConstraintKind, lhs: Expression, relation: ConstraintRelation, rhs: f64) -> Self {
        Self {
            kind,
            lhs,
            relation,
            rhs,
        }
    }
}

/// Decision variables for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryVars {
    /// Boxes shipped (integer)
    pub boxes: Variable,

    /// Whether the category ships at all (binary)
    pub selected: Variable,

    /// Total weight attributed to the category (continuous)
    pub weight: Variable,
}

/// Builder state for the packing model's variables, objective and constraints
pub struct ModelState {
    pb: ProblemVariables,
    objective: Expression,
    categories: SmallVec<[CategoryVars; 16]>,
    constraints: Vec<ModelConstraint>,
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelState")
            .field("pb", &"<ProblemVariables>")
            .field("objective", &"<Expression>")
            .field(
                "categories",
                &format!("[{} categories]", self.categories.len()),
            )
            .field(
                "constraints",
                &format!("[{} constraints]", self.constraints.len()),
            )
            .finish()
    }
}

impl Default for ModelState {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelState {
    /// Create an empty model.
    pub fn new() -> Self {
        Self {
            pb: ProblemVariables::new(),
            objective: Expression::default(),
            categories: SmallVec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add the box, selection and weight variables for one more category.
    ///
    /// Box counts are capped at the shipment box count and weights at the
    /// shipment weight; the constraints imply both, the bounds just keep the
    /// branch-and-bound search small.
    pub fn add_category(&mut self, max_boxes: f64, max_weight: f64) -> CategoryVars {
        let vars = CategoryVars {
            boxes: self.pb.add(variable().integer().min(0).max(max_boxes)),
            selected: self.pb.add(variable().binary()),
            weight: self.pb.add(variable().min(0).max(max_weight)),
        };

        self.categories.push(vars);

        vars
    }

    /// Add a term to the objective (total duty).
    pub fn add_to_objective(&mut self, var: Variable, coefficient: f64) {
        self.objective += var * coefficient;
    }

    /// Record a constraint.
    pub fn add_constraint(&mut self, constraint: ModelConstraint) {
        self.constraints.push(constraint);
    }

    /// Variables of every category, in catalog order.
    pub fn categories(&self) -> &[CategoryVars] {
        &self.categories
    }

    /// Constraints recorded so far.
    pub fn constraints(&self) -> &[ModelConstraint] {
        &self.constraints
    }

    /// Objective expression.
    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    /// Extract the problem variables, objective, category variables and all
    /// recorded constraints.
    pub(crate) fn into_parts(
        self,
    ) -> (
        ProblemVariables,
        Expression,
        SmallVec<[CategoryVars; 16]>,
        Vec<ModelConstraint>,
    ) {
        (self.pb, self.objective, self.categories, self.constraints)
    }
}
