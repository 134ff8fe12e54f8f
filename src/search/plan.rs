use crate::search::predicate::{Expr, Join, OrderTerm, QueryPlan, Source};

/// Result of compiling a filter: either a plan to execute, or a known empty result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Plan(QueryPlan),
    Empty,
}

/// Accumulates query fragments. Fragments are never rewritten once added;
/// pagination is applied by [`PlanBuilder::build`].
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    source: Source,
    joins: Vec<Join>,
    predicates: Vec<Expr>,
    group_by: Vec<&'static str>,
    order: Vec<OrderTerm>,
}

impl PlanBuilder {
    pub fn new(source: Source) -> Self {
        Self { source, joins: Vec::new(), predicates: Vec::new(), group_by: Vec::new(), order: Vec::new() }
    }

    /// Adds a join unless one on the same table exists.
    pub fn join(&mut self, join: Join) -> &mut Self {
        if !self.joins.iter().any(|j| j.table == join.table) {
            self.joins.push(join);
        }
        self
    }

    pub fn has_join(&self, table: &str) -> bool {
        self.joins.iter().any(|j| j.table == table)
    }

    pub fn filter(&mut self, expr: Expr) -> &mut Self {
        self.predicates.push(expr);
        self
    }

    pub fn filters(&mut self, exprs: impl IntoIterator<Item = Expr>) -> &mut Self {
        self.predicates.extend(exprs);
        self
    }

    pub fn group_by(&mut self, cols: &[&'static str]) -> &mut Self {
        for c in cols {
            if !self.group_by.contains(c) {
                self.group_by.push(c);
            }
        }
        self
    }

    pub fn order(&mut self, terms: Vec<OrderTerm>) -> &mut Self {
        self.order = terms;
        self
    }

    pub fn predicates(&self) -> &[Expr] {
        &self.predicates
    }

    pub fn build(self, limit: i64, offset: i64) -> QueryPlan {
        QueryPlan {
            source: self.source,
            joins: self.joins,
            predicates: self.predicates,
            group_by: self.group_by,
            order: self.order,
            limit,
            offset,
        }
    }
}
