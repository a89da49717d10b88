//! What-if queries example
//!
//! This example shows:
//! - Scoped overrides that answer "what if X were Y" without touching the profile
//! - Overrides whose values are themselves formulas
//! - Overlaying a temporary profile on top of a base one
//! - Loading a profile from JSON through a field registry
//! - Checking a formula set for cycles before using it

use statprofile::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), ProfileError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut registry = FieldRegistry::new();
    let energy_recharge = registry.register(Field::builder("energy_recharge").default(1.0).build())?;
    let burst_bonus = registry.define("burst_bonus")?;
    let level = registry.define("level")?;
    let hp = registry.define("hp")?;
    let shield = registry.define("shield")?;

    let base = registry.profile_from_str(
        r#"{
            "energy_recharge": [1.0, 0.551],
            "level": 90,
            "hp": [15000, 4780]
        }"#,
    )?;
    let formulas = Profile::builder()
        // 25% of energy recharge above 100%, capped at 75%
        .insert(&burst_bonus, min((&energy_recharge - 1.0) * 0.25, 0.75))
        .insert(&shield, &hp * 0.2 + &level * 10)
        .insert(shield.when(level.lt(40)), 0)
        .build();
    let profile = &formulas + &base;

    println!("=== Base profile ===\n");
    println!("{:?}\n", profile);
    println!("burst_bonus = {}", profile.get(&burst_bonus)?);
    println!("shield      = {}", profile.get(&shield)?);

    println!("\n=== What if? ===\n");
    for er in [1.5, 2.0, 4.0] {
        let bonus = profile.get_with(&burst_bonus, [(&energy_recharge, er)])?;
        println!("energy_recharge {:.1} -> burst_bonus {}", er, bonus);
    }
    let doubled = profile.get_with(&shield, [(&hp, &hp * 2)]);
    match doubled {
        // hp := hp * 2 reads itself inside the scope
        Err(ProfileError::RecursionLimit { field, limit }) => {
            println!("doubling hp in place loops: {} after {} lookups", field, limit)
        }
        other => println!("doubling hp in place: {:?}", other),
    }
    let low_level = profile.get_with(&shield, [(&level, 20)])?;
    println!("shield at level 20: {}", low_level);
    println!("level is still {}", profile.get(&level)?);

    println!("\n=== Overlay ===\n");
    let buffed = Profile::builder().insert(&energy_recharge, 2.6).build();
    let overlaid = buffed.overlay(&profile);
    println!("energy_recharge overlaid: {}", overlaid.get(&energy_recharge)?);
    println!("burst_bonus overlaid:     {}", overlaid.get(&burst_bonus)?);
    println!("merged instead:           {}", (&profile + &buffed).get(&energy_recharge)?);

    println!("\n=== Static checks ===\n");
    match profile.check_acyclic() {
        Ok(()) => println!("formulas are acyclic"),
        Err(e) => println!("unexpected: {}", e),
    }
    let looping = Profile::builder()
        .insert(&hp, &shield * 5)
        .build()
        .overlay(&profile);
    match looping.check_acyclic() {
        Err(e) => println!("caught before evaluation: {}", e),
        Ok(()) => println!("no cycle found"),
    }

    match registry.profile_from_str(r#"{ "mana": 100 }"#) {
        Err(e) => println!("rejected profile: {}", e),
        Ok(_) => println!("unexpectedly accepted"),
    }

    Ok(())
}
