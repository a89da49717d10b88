//! Damage formula example
//!
//! This example builds a small damage model out of profiles:
//! - A formula profile shared by every character (atk, crit, mean damage)
//! - A character profile and a weapon profile merged with `+`
//! - A conditional buff that only applies below half HP
//! - Clamping crit rate into [0, 1] with `min`/`max`
//! - A per-contribution breakdown with `explain`
//!
//! Run with `RUST_LOG=statprofile=trace` to watch field resolution.

use statprofile::*;
use tracing_subscriber::EnvFilter;

/// All fields the damage model knows about.
///
/// Fields are plain values; the model owns them and hands them to
/// whatever builds profiles.
struct Stats {
    atk_base: Field,
    atk_percent: Field,
    atk_flat: Field,
    atk: Field,
    crit_rate: Field,
    crit_dmg: Field,
    dmg_bonus: Field,
    hp_ratio: Field,
    talent_scale: Field,
    mean_damage: Field,
}

impl Stats {
    fn new() -> Self {
        Self {
            atk_base: Field::new("atk_base"),
            atk_percent: Field::new("atk_percent"),
            atk_flat: Field::new("atk_flat"),
            atk: Field::new("atk"),
            crit_rate: Field::builder("crit_rate").default(0.05).build(),
            crit_dmg: Field::builder("crit_dmg").default(0.5).build(),
            dmg_bonus: Field::new("dmg_bonus"),
            hp_ratio: Field::builder("hp_ratio").default(1.0).build(),
            talent_scale: Field::builder("talent_scale").default(1.0).build(),
            mean_damage: Field::new("mean_damage"),
        }
    }

    /// Formulas shared by every character.
    fn formulas(&self) -> Profile {
        let crit = max(0.0, min(&self.crit_rate, 1.0));
        Profile::builder()
            .insert(
                &self.atk,
                &self.atk_base * (1.0 + &self.atk_percent) + &self.atk_flat,
            )
            .insert(
                &self.mean_damage,
                &self.atk
                    * &self.talent_scale
                    * (1.0 + &self.dmg_bonus)
                    * (1.0 + crit * &self.crit_dmg),
            )
            .build()
    }
}

fn main() -> Result<(), ProfileError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let stats = Stats::new();

    let character = Profile::builder()
        .insert(&stats.atk_base, 250)
        .insert(&stats.atk_percent, 0.466)
        .insert(&stats.crit_rate, 0.62)
        .insert(&stats.crit_dmg, 1.24)
        .insert(&stats.talent_scale, 1.8)
        // berserk: +35% damage while below half HP
        .insert(stats.dmg_bonus.when(stats.hp_ratio.lt(0.5)), 0.35)
        .build();

    let weapon = Profile::builder()
        .insert(&stats.atk_base, 510)
        .insert(&stats.crit_rate, 0.551)
        .insert(&stats.dmg_bonus, 0.15)
        .build();

    let equipped = stats.formulas() + character + weapon;

    println!("=== Equipped character ===\n");
    for field in [
        &stats.atk_base,
        &stats.atk,
        &stats.crit_rate,
        &stats.crit_dmg,
        &stats.dmg_bonus,
        &stats.mean_damage,
    ] {
        println!("{:>12}: {}", field.name(), equipped.get(field)?);
    }

    println!("\n=== Crit rate is clamped ===\n");
    let crit = equipped.explain(&stats.crit_rate)?;
    println!(
        "raw crit_rate {} from {} contributions ({})",
        crit.value,
        crit.contributions.len(),
        crit.combinator
    );
    println!(
        "mean damage treats it as {}",
        max(0.0, min(&stats.crit_rate, 1.0)).evaluate(&equipped)?
    );

    println!("\n=== Berserk buff ===\n");
    let bonus = equipped.explain(&stats.dmg_bonus)?;
    for (expr, outcome) in &bonus.contributions {
        match outcome {
            Outcome::Resolved(value) => println!("  {:<24} -> {}", expr, value),
            Outcome::Unmet => println!("  {:<24} -> (guard not met)", expr),
        }
    }
    println!("dmg_bonus at full HP: {}", bonus.value);

    let low_hp = equipped.get_with(&stats.mean_damage, [(&stats.hp_ratio, 0.3)])?;
    println!(
        "mean damage at full HP: {:.1}, at 30% HP: {:.1}",
        equipped.get_number(&stats.mean_damage)?,
        low_hp.as_number().unwrap_or_default()
    );

    println!("\n=== Breakdown as JSON ===\n");
    let report = equipped.explain(&stats.atk_base)?;
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("could not serialize breakdown: {}", e),
    }

    Ok(())
}
