//! Profile module.
//!
//! Provides the `Profile` type, which maps fields to ordered lists of
//! contributions and is itself the context those contributions are
//! evaluated in. Profiles are immutable once built: merging, overlaying
//! and scoped queries all produce new profiles.

use crate::context::{Context, EvalConfig};
use crate::error::ProfileError;
use crate::expr::{Expr, Outcome};
use crate::field::Field;
use crate::graph::FieldGraph;
use crate::guard::GuardedField;
use crate::resolved::ResolvedField;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::ops::Add;
use tracing::{debug, trace};

/// Key of a profile entry: a plain field or a guarded field.
#[derive(Debug, Clone)]
pub enum ProfileKey {
    Field(Field),
    Guarded(GuardedField),
}

impl ProfileKey {
    /// Normalize into the stored field and contribution.
    fn into_entry(self, value: Expr) -> (Field, Expr) {
        match self {
            ProfileKey::Field(field) => (field, value),
            ProfileKey::Guarded(guarded) => {
                let expr = guarded.bind(value);
                (guarded.field().clone(), expr)
            }
        }
    }
}

impl From<Field> for ProfileKey {
    fn from(field: Field) -> Self {
        ProfileKey::Field(field)
    }
}

impl From<&Field> for ProfileKey {
    fn from(field: &Field) -> Self {
        ProfileKey::Field(field.clone())
    }
}

impl From<GuardedField> for ProfileKey {
    fn from(guarded: GuardedField) -> Self {
        ProfileKey::Guarded(guarded)
    }
}

impl From<&GuardedField> for ProfileKey {
    fn from(guarded: &GuardedField) -> Self {
        ProfileKey::Guarded(guarded.clone())
    }
}

/// A mapping from fields to ordered contribution lists.
///
/// Querying a field evaluates every contribution against the profile
/// itself, drops the ones whose guard was not met and folds the rest
/// with the field's combinator. With nothing left, the field's default
/// is evaluated against the profile instead.
///
/// # Examples
///
/// ```rust
/// use statprofile::{Field, Profile, Value};
///
/// let atk_base = Field::new("atk_base");
/// let atk_percent = Field::new("atk_percent");
/// let atk_flat = Field::new("atk_flat");
/// let atk = Field::new("atk");
///
/// let character = Profile::builder()
///     .insert(&atk_base, 100)
///     .insert(&atk_percent, 0.5)
///     .insert(&atk, &atk_base * (1.0 + &atk_percent) + &atk_flat)
///     .build();
/// let weapon = Profile::builder().insert(&atk_flat, 20).build();
///
/// let total = &character + &weapon;
/// assert_eq!(total.get(&atk).unwrap(), Value::Number(170.0));
/// ```
#[derive(Clone, Default)]
pub struct Profile {
    entries: HashMap<Field, Vec<Expr>>,
    config: EvalConfig,
}

impl Profile {
    /// Build a profile from `(key, value)` pairs.
    ///
    /// Pairs sharing a field are kept in order. Guarded keys store their
    /// value wrapped in the guard.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ProfileKey>,
        V: Into<Expr>,
    {
        let mut profile = Profile::empty();
        for (key, value) in entries {
            let (field, expr) = key.into().into_entry(value.into());
            profile.entries.entry(field).or_default().push(expr);
        }
        debug!(fields = profile.len(), "built profile");
        profile
    }

    /// A profile with no contributions. Every query yields a default.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a profile entry by entry.
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    /// Replace the evaluation settings.
    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Evaluation settings.
    pub fn config(&self) -> EvalConfig {
        self.config
    }

    /// Number of fields with at least one contribution.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field has a contribution.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `field` has at least one contribution.
    pub fn contains(&self, field: &Field) -> bool {
        self.entries.contains_key(field)
    }

    /// Fields with at least one contribution, in no particular order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.entries.keys()
    }

    /// The raw contribution list for `field`, empty if absent.
    pub fn contributions(&self, field: &Field) -> &[Expr] {
        self.entries.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve `field`.
    ///
    /// Every contribution is evaluated against this profile, unmet
    /// guards are dropped, and the rest are folded with the field's
    /// combinator. With nothing left the field's default is evaluated.
    ///
    /// # Arguments
    ///
    /// * `field` - The field to resolve
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The resolved value
    /// * `Err(ProfileError)` - If an operand, combinator or depth error occurs
    pub fn get(&self, field: &Field) -> Result<Value, ProfileError> {
        self.root().lookup(field)
    }

    /// Resolve `field` and require a number.
    pub fn get_number(&self, field: &Field) -> Result<f64, ProfileError> {
        self.get(field)?.expect_number("query")
    }

    /// Resolve `field` as if each `(other, value)` override replaced
    /// every contribution to `other`.
    ///
    /// The overrides are evaluated lazily in the overridden profile.
    /// `self` is not modified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statprofile::{Field, Profile, Value};
    ///
    /// let er = Field::new("energy_recharge");
    /// let burst = Field::new("burst_bonus");
    /// let profile = Profile::builder()
    ///     .insert(&er, 1.2)
    ///     .insert(&burst, &er * 0.25)
    ///     .build();
    ///
    /// assert_eq!(profile.get_with(&burst, [(&er, 2.0)]).unwrap(), Value::Number(0.5));
    /// assert_eq!(profile.get(&er).unwrap(), Value::Number(1.2));
    /// ```
    pub fn get_with<I, K, V>(&self, field: &Field, overrides: I) -> Result<Value, ProfileError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Field>,
        V: Into<Expr>,
    {
        let overrides: Vec<(Field, Expr)> = overrides
            .into_iter()
            .map(|(other, value)| (other.into(), value.into()))
            .collect();
        self.root().lookup_scoped(field, &overrides)
    }

    /// Evaluate every contribution of `field` without combining them.
    ///
    /// Unmet guards show up as `Outcome::Unmet`; an absent field yields
    /// an empty list.
    pub fn resolve_contributions(&self, field: &Field) -> Result<Vec<Outcome>, ProfileError> {
        self.root().enter(field)?.outcomes(field)
    }

    /// Resolve `field` and report how each contribution took part.
    pub fn explain(&self, field: &Field) -> Result<ResolvedField, ProfileError> {
        let scope = self.root().enter(field)?;
        let mut resolved = ResolvedField::new(field.name(), field.combinator().name());

        for expr in self.contributions(field) {
            let outcome = expr.resolve(&scope)?;
            resolved.add_contribution(expr.to_string(), outcome);
        }

        let applied = resolved.applied();
        resolved.used_default = applied.is_empty();
        resolved.value = scope.finish(field, &applied)?;
        Ok(resolved)
    }

    /// Additive merge: every field gets `self`'s contributions followed
    /// by `other`'s. Settings are taken from `self`.
    pub fn merge(&self, other: &Profile) -> Profile {
        let mut entries = self.entries.clone();
        for (field, exprs) in &other.entries {
            entries
                .entry(field.clone())
                .or_default()
                .extend(exprs.iter().cloned());
        }
        debug!(
            left = self.len(),
            right = other.len(),
            merged = entries.len(),
            "merged profiles"
        );
        Profile {
            entries,
            config: self.config,
        }
    }

    /// Priority overlay: a field with contributions in `self` keeps
    /// exactly those, every other field comes from `other`. Settings are
    /// taken from `self`.
    pub fn overlay(&self, other: &Profile) -> Profile {
        let mut entries = other.entries.clone();
        for (field, exprs) in &self.entries {
            entries.insert(field.clone(), exprs.clone());
        }
        debug!(
            top = self.len(),
            base = other.len(),
            overlaid = entries.len(),
            "overlaid profiles"
        );
        Profile {
            entries,
            config: self.config,
        }
    }

    /// The static dependency graph between fields reachable from this
    /// profile.
    pub fn dependency_graph(&self) -> FieldGraph {
        FieldGraph::from_profile(self)
    }

    /// Check that no field formula can reach itself.
    ///
    /// The check is conservative: guards are ignored, and opaque
    /// `Expr::from_fn` computations are assumed to read nothing.
    pub fn check_acyclic(&self) -> Result<(), ProfileError> {
        self.dependency_graph().detect_cycles()
    }

    fn root(&self) -> Scope<'_> {
        Scope {
            profile: self,
            depth: 0,
        }
    }
}

impl Context for Profile {
    fn lookup(&self, field: &Field) -> Result<Value, ProfileError> {
        self.root().lookup(field)
    }

    fn lookup_scoped(
        &self,
        field: &Field,
        overrides: &[(Field, Expr)],
    ) -> Result<Value, ProfileError> {
        self.root().lookup_scoped(field, overrides)
    }
}

/// A profile seen from a given lookup depth.
struct Scope<'a> {
    profile: &'a Profile,
    depth: usize,
}

impl<'a> Scope<'a> {
    /// Step one lookup deeper, failing past the configured limit.
    fn enter(&self, field: &Field) -> Result<Scope<'a>, ProfileError> {
        let limit = self.profile.config.max_depth;
        if self.depth >= limit {
            debug!(name = field.name(), limit, "recursion limit reached");
            return Err(ProfileError::RecursionLimit {
                field: field.name().to_string(),
                limit,
            });
        }
        Ok(Scope {
            profile: self.profile,
            depth: self.depth + 1,
        })
    }

    fn outcomes(&self, field: &Field) -> Result<Vec<Outcome>, ProfileError> {
        self.profile
            .contributions(field)
            .iter()
            .map(|expr| expr.resolve(self))
            .collect()
    }

    /// Combine applied values, or fall back to the field's default.
    fn finish(&self, field: &Field, applied: &[Value]) -> Result<Value, ProfileError> {
        if applied.is_empty() {
            field.default_value().evaluate(self)
        } else {
            field.combinator().combine(applied)
        }
    }
}

impl Context for Scope<'_> {
    fn lookup(&self, field: &Field) -> Result<Value, ProfileError> {
        let scope = self.enter(field)?;
        let applied: Vec<Value> = scope
            .outcomes(field)?
            .into_iter()
            .filter_map(Outcome::value)
            .collect();
        trace!(
            name = field.name(),
            depth = scope.depth,
            applied = applied.len(),
            used_default = applied.is_empty(),
            "resolving field"
        );
        scope.finish(field, &applied)
    }

    fn lookup_scoped(
        &self,
        field: &Field,
        overrides: &[(Field, Expr)],
    ) -> Result<Value, ProfileError> {
        let transient = Profile::new(overrides.iter().cloned());
        let overlaid = transient
            .overlay(self.profile)
            .with_config(self.profile.config);
        Scope {
            profile: &overlaid,
            depth: self.depth,
        }
        .lookup(field)
    }
}

impl Add for Profile {
    type Output = Profile;
    fn add(self, other: Profile) -> Profile {
        self.merge(&other)
    }
}

impl Add<&Profile> for &Profile {
    type Output = Profile;
    fn add(self, other: &Profile) -> Profile {
        self.merge(other)
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<(&Field, &Vec<Expr>)> = self.entries.iter().collect();
        fields.sort_by(|a, b| a.0.name().cmp(b.0.name()));
        f.debug_map()
            .entries(fields.into_iter().map(|(field, exprs)| {
                let exprs: Vec<String> = exprs.iter().map(|e| e.to_string()).collect();
                (field.name().to_string(), exprs)
            }))
            .finish()
    }
}

/// Builder collecting profile entries in order.
#[derive(Default)]
pub struct ProfileBuilder {
    entries: Vec<(ProfileKey, Expr)>,
    config: EvalConfig,
}

impl ProfileBuilder {
    /// Register `value` under `key`. Repeated keys accumulate.
    pub fn insert(mut self, key: impl Into<ProfileKey>, value: impl Into<Expr>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Use `config` for the built profile.
    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish the profile.
    ///
    /// Entries keep their insertion order per field.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statprofile::{EvalConfig, Field, Profile, Value};
    ///
    /// let hp = Field::new("hp");
    /// let profile = Profile::builder()
    ///     .insert(&hp, 1000)
    ///     .insert(&hp, 200)
    ///     .config(EvalConfig::with_max_depth(32))
    ///     .build();
    ///
    /// assert_eq!(profile.get(&hp).unwrap(), Value::Number(1200.0));
    /// assert_eq!(profile.config().max_depth, 32);
    /// ```
    pub fn build(self) -> Profile {
        Profile::new(self.entries).with_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::Combinator;

    fn labels(profile: &Profile, field: &Field) -> Vec<String> {
        profile
            .contributions(field)
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn test_missing_field_uses_default() {
        let base = Field::new("base");
        let derived = Field::builder("derived").default(&base * 2).build();
        let profile = Profile::builder().insert(&base, 21).build();

        assert_eq!(profile.get(&derived).unwrap(), Value::Number(42.0));
        assert!(!profile.contains(&derived));
        assert!(profile.contributions(&derived).is_empty());
    }

    #[test]
    fn test_guarded_key_is_normalized() {
        let x = Field::new("x");
        let y = Field::new("y");
        let profile = Profile::builder()
            .insert(&x, 1)
            .insert(y.when(x.gt(0)), 4)
            .build();

        assert!(profile.contains(&y));
        assert_eq!(labels(&profile, &y), vec!["4 if (<x> > 0)"]);
        assert_eq!(profile.len(), 2);
    }

    #[test]
    fn test_merge_keeps_order() {
        let x = Field::builder("x").combinator(Combinator::Last).build();
        let a = Profile::builder().insert(&x, 1).insert(&x, 2).build();
        let b = Profile::builder().insert(&x, 3).build();

        let ab = &a + &b;
        assert_eq!(labels(&ab, &x), vec!["1", "2", "3"]);
        assert_eq!(ab.get(&x).unwrap(), Value::Number(3.0));

        let ba = &b + &a;
        assert_eq!(ba.get(&x).unwrap(), Value::Number(2.0));

        // operands are untouched
        assert_eq!(labels(&a, &x), vec!["1", "2"]);
    }

    #[test]
    fn test_overlay_is_whole_field() {
        let x = Field::new("x");
        let y = Field::new("y");
        let top = Profile::builder().insert(&x, 10).build();
        let base = Profile::builder()
            .insert(&x, 1)
            .insert(&x, 2)
            .insert(&y, 5)
            .build();

        let merged = top.overlay(&base);
        assert_eq!(labels(&merged, &x), vec!["10"]);
        assert_eq!(merged.get(&y).unwrap(), Value::Number(5.0));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_scoped_query_leaves_profile_untouched() {
        let a = Field::new("a");
        let b = Field::new("b");
        let profile = Profile::builder()
            .insert(&a, 2)
            .insert(&b, &a * 10)
            .build();

        assert_eq!(profile.get_with(&b, [(&a, 5)]).unwrap(), Value::Number(50.0));
        assert_eq!(profile.get(&a).unwrap(), Value::Number(2.0));
        assert_eq!(profile.get(&b).unwrap(), Value::Number(20.0));
    }

    #[test]
    fn test_override_values_read_the_overridden_profile() {
        let a = Field::new("a");
        let b = Field::new("b");
        let c = Field::new("c");
        let profile = Profile::builder()
            .insert(&a, 1)
            .insert(&b, 100)
            .insert(&c, &a + &b)
            .build();

        // a := b + 1 is evaluated in the overridden profile
        let value = profile.get_with(&c, [(&a, &b + 1)]).unwrap();
        assert_eq!(value, Value::Number(201.0));
    }

    #[test]
    fn test_cycle_hits_recursion_limit() {
        let a = Field::new("a");
        let b = Field::new("b");
        let profile = Profile::builder()
            .insert(&a, &b + 1)
            .insert(&b, &a + 1)
            .config(EvalConfig::with_max_depth(16))
            .build();

        match profile.get(&a) {
            Err(ProfileError::RecursionLimit { limit, .. }) => assert_eq!(limit, 16),
            other => panic!("expected RecursionLimit, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_limit_allows_deep_chains() {
        let fields: Vec<Field> = (0..20).map(|i| Field::new(format!("f{}", i))).collect();
        let mut builder = Profile::builder().insert(&fields[0], 1);
        for pair in fields.windows(2) {
            builder = builder.insert(&pair[1], &pair[0] + 1);
        }
        let profile = builder.config(EvalConfig::with_max_depth(20)).build();
        assert_eq!(profile.get(&fields[19]).unwrap(), Value::Number(20.0));

        let shallow = profile.with_config(EvalConfig::with_max_depth(19));
        assert!(shallow.get(&fields[19]).is_err());
    }

    #[test]
    fn test_resolve_contributions() {
        let x = Field::new("x");
        let y = Field::new("y");
        let profile = Profile::builder()
            .insert(&x, 3)
            .insert(&y, 1)
            .insert(y.when(x.gt(5)), 2)
            .insert(&y, &x)
            .build();

        assert_eq!(
            profile.resolve_contributions(&y).unwrap(),
            vec![
                Outcome::Resolved(Value::Number(1.0)),
                Outcome::Unmet,
                Outcome::Resolved(Value::Number(3.0)),
            ]
        );
        assert!(profile
            .resolve_contributions(&Field::new("absent"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_explain_reports_default() {
        let x = Field::new("x");
        let y = Field::builder("y").default(7).build();
        let profile = Profile::builder().insert(y.when(x.gt(0)), 1).build();

        let resolved = profile.explain(&y).unwrap();
        assert!(resolved.used_default);
        assert_eq!(resolved.value, Value::Number(7.0));
        assert_eq!(resolved.unmet_count(), 1);
    }

    #[test]
    fn test_merge_keeps_left_config() {
        let left = Profile::empty().with_config(EvalConfig::with_max_depth(4));
        let right = Profile::empty();
        assert_eq!((&left + &right).config().max_depth, 4);
        assert_eq!(right.overlay(&left).config(), EvalConfig::default());
    }

    #[test]
    fn test_debug_lists_fields_by_name() {
        let b = Field::new("b");
        let a = Field::new("a");
        let profile = Profile::builder().insert(&b, 2).insert(&a, 1).build();
        assert_eq!(format!("{:?}", profile), r#"{"a": ["1"], "b": ["2"]}"#);
    }

    #[test]
    fn test_get_number_rejects_bool() {
        let flag = Field::new("flag");
        let profile = Profile::builder().insert(&flag, true).build();
        assert!(profile.get_number(&flag).is_err());
        assert_eq!(profile.get(&flag).unwrap(), Value::Bool(true));
    }
}
