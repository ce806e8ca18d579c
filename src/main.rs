//! lumenbind - Profile Player
//!
//! Loads a lighting profile, binds its layer properties to a simulated system
//! data model and resolves every binding once per frame.
//!
//! Usage: `lumenbind [--config <file>] [--save [<file>]] [profile]`

use anyhow::Context;
use clap::Parser;
use lumenbind::{
    binding::{BindingContext, BindingModeKind, DataBinding, Easing, LayerProperty, ParameterKind},
    conditions::{ConditionOperator, DataModelPredicate},
    config::{ensure_app_data_dir, EngineConfig, ProfileFile, PROFILE_FILE_EXTENSION},
    datamodel::{DataModel, DataModelPath, DataModelRegistry, StructDef},
    id::ProviderId,
    modifiers::{register_builtins, ModifierTypeKey, ModifierTypeRegistry, ScriptModifier},
    types::{Color, Value, ValueType},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Provider of the simulated system data model
const SYSTEM_PROVIDER: ProviderId = ProviderId(Uuid::from_u128(0x2b6e_91d0_4f3a_4e7c_8d15_a0c3_77e2_5e01));

/// Provider of script modifiers declared in the engine config
const SCRIPT_PROVIDER: ProviderId = ProviderId(Uuid::from_u128(0x2b6e_91d0_4f3a_4e7c_8d15_a0c3_77e2_5e02));

/// Layer properties of the demo layer, with their base values
fn layer_properties() -> Vec<(LayerProperty, Value)> {
    vec![
        (LayerProperty::new("brush.size", ValueType::Float), Value::Float(10.0)),
        (
            LayerProperty::new("brush.color", ValueType::Color),
            Value::Color(Color::rgb(0, 128, 255)),
        ),
        (LayerProperty::new("opacity", ValueType::Float), Value::Float(1.0)),
    ]
}

fn system_model() -> DataModel {
    DataModel::new(
        SYSTEM_PROVIDER,
        "System",
        StructDef::new("System")
            .with_struct(
                "cpu",
                StructDef::new("Cpu")
                    .with_primitive("load", ValueType::Float)
                    .with_primitive("temperature", ValueType::Int),
            )
            .with_struct(
                "audio",
                StructDef::new("Audio")
                    .with_primitive("volume", ValueType::Float)
                    .with_primitive("muted", ValueType::Bool),
            ),
    )
}

#[derive(Parser, Debug)]
#[command(name = "lumenbind")]
#[command(about = "Plays a lighting profile against simulated system data")]
struct Args {
    /// Engine config file (defaults to the one in the app data directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Save the played profile on exit, into the app data directory when no
    /// path is given
    #[arg(short, long, num_args = 0..=1)]
    save: Option<Option<PathBuf>>,

    /// Profile to play (defaults to the built-in sample)
    profile: Option<PathBuf>,
}

/// Where `--save` writes the profile.
fn save_path(save: Option<PathBuf>, profile: &ProfileFile) -> anyhow::Result<PathBuf> {
    match save {
        Some(path) => Ok(path),
        None => {
            let dir = ensure_app_data_dir()?;
            Ok(dir.join(format!("{}.{}", profile.name, PROFILE_FILE_EXTENSION)))
        }
    }
}

/// Build the bindings of the built-in sample profile.
fn sample_bindings(
    data_models: &Arc<DataModelRegistry>,
    modifier_types: &Arc<ModifierTypeRegistry>,
    system: &Arc<DataModel>,
    easing_ms: u64,
) -> lumenbind::Result<Vec<DataBinding>> {
    let context = |path: &str, ty| {
        BindingContext::new(LayerProperty::new(path, ty), Arc::clone(data_models), Arc::clone(modifier_types))
    };

    // brush.size = 10 + cpu.load * 40
    let mut size = DataBinding::new(context("brush.size", ValueType::Float));
    size.change_mode(Some(BindingModeKind::Direct))?;
    if let Some(direct) = size.direct_mut() {
        direct.update_source(Some(system), Some("cpu.load"))?;
        for (name, param) in [("Multiply", 40.0), ("Add", 10.0)] {
            let key = ModifierTypeKey::new(ProviderId::BUILTIN, name);
            let modifier = direct.add_modifier(ParameterKind::Static)?;
            modifier.update_modifier_type(modifier_types.get(&key).as_ref())?;
            modifier.update_parameter_static(Some(Value::Float(param)))?;
        }
    }
    size.set_easing(Duration::from_millis(easing_ms), Easing::EaseInOut)?;

    // brush.color turns red above 80 degrees
    let mut color = DataBinding::new(context("brush.color", ValueType::Color));
    color.change_mode(Some(BindingModeKind::Conditional))?;
    if let Some(conditional) = color.conditional_mut() {
        let condition = conditional.add_condition()?;
        let temperature = DataModelPath::new(data_models, system, "cpu.temperature")?;
        condition.condition_mut()?.add_predicate(DataModelPredicate::with_static(
            temperature,
            ConditionOperator::GreaterThan,
            80,
        ))?;
        condition.update_value(Some(Value::Color(Color::rgb(255, 0, 0))))?;
    }

    // opacity follows the volume
    let mut opacity = DataBinding::new(context("opacity", ValueType::Float));
    opacity.change_mode(Some(BindingModeKind::Direct))?;
    if let Some(direct) = opacity.direct_mut() {
        direct.update_source(Some(system), Some("audio.volume"))?;
    }

    Ok(vec![size, color, opacity])
}

/// Hydrate the bindings of a saved profile onto the demo layer.
fn load_bindings(
    profile: &ProfileFile,
    data_models: &Arc<DataModelRegistry>,
    modifier_types: &Arc<ModifierTypeRegistry>,
) -> Vec<DataBinding> {
    let properties = layer_properties();
    profile
        .bindings
        .iter()
        .filter_map(|entity| {
            let Some((property, _)) = properties.iter().find(|(p, _)| p.path == entity.identifier) else {
                tracing::warn!("Profile binds unknown layer property '{}'", entity.identifier);
                return None;
            };
            let context = BindingContext::new(property.clone(), Arc::clone(data_models), Arc::clone(modifier_types));
            Some(DataBinding::from_entity(context, entity))
        })
        .collect()
}

/// Publish synthetic system readings for time `t` (seconds).
fn simulate(system: &DataModel, t: f64) -> lumenbind::Result<()> {
    system.set_value("cpu.load", 0.5 + 0.5 * (t * 0.7).sin())?;
    system.set_value("cpu.temperature", 65.0 + 20.0 * (t * 0.2).sin())?;
    system.set_value("audio.volume", 0.5 + 0.5 * (t * 1.3).cos())?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = EngineConfig::load_or_default(args.config.as_deref());

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let (file_layer, _guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lumenbind.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    tracing::info!("Starting lumenbind player");

    let data_models = Arc::new(DataModelRegistry::new());
    let modifier_types = Arc::new(ModifierTypeRegistry::new());
    let count = register_builtins(&modifier_types);
    tracing::debug!("Registered {} built-in modifier types", count);

    for script in &config.script_modifiers {
        match ScriptModifier::compile(&script.name, &script.source) {
            Ok(modifier) => {
                modifier_types.register(SCRIPT_PROVIDER, Arc::new(modifier));
            }
            Err(e) => tracing::warn!("Skipping script modifier '{}': {}", script.name, e),
        }
    }

    let system = data_models.add(system_model());

    let (mut profile, mut bindings) = match &args.profile {
        Some(path) => {
            let profile = ProfileFile::load(path).with_context(|| format!("Loading profile {:?}", path))?;
            tracing::info!("Loaded profile '{}' saved at {}", profile.name, profile.saved_at);
            let bindings = load_bindings(&profile, &data_models, &modifier_types);
            (profile, bindings)
        }
        None => {
            tracing::info!("No profile given, playing the sample profile");
            let bindings = sample_bindings(&data_models, &modifier_types, &system, config.default_easing_ms)?;
            (ProfileFile::new("Sample"), bindings)
        }
    };

    let properties = layer_properties();
    let interval = config.frame_interval();
    let start = Instant::now();
    let mut last = start;
    let mut frame: u64 = 0;
    while config.frames == 0 || frame < config.frames {
        let now = Instant::now();
        simulate(&system, now.duration_since(start).as_secs_f64())?;

        for binding in &mut bindings {
            let Some((_, base)) = properties.iter().find(|(p, _)| p.path == binding.property().path) else {
                continue;
            };
            binding.update(now.duration_since(last))?;
            let value = binding.resolve(base)?;
            tracing::debug!("frame {:>5} {:<12} = {}", frame, binding.property().path, value);
        }

        last = now;
        frame += 1;
        std::thread::sleep(interval.saturating_sub(now.elapsed()));
    }

    if let Some(save) = args.save {
        let path = save_path(save, &profile)?;
        profile.bindings = bindings
            .iter()
            .map(DataBinding::save)
            .collect::<lumenbind::Result<Vec<_>>>()?;
        profile.save(&path)?;
        tracing::info!("Saved profile to {:?}", path);
    }

    tracing::info!("Shutting down...");
    for binding in &mut bindings {
        binding.dispose();
    }
    Ok(())
}
