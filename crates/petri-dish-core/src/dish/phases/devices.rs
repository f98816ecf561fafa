use super::super::{Effect, Emission, PetriDish};
use crate::constants::MAX_DEVICE_FREQUENCY;
use crate::occupant::{Device, DeviceKind, Occupant};
use crate::substance::{settle, Substance, SubstanceKind};
use rand::Rng;
use tracing::debug;

impl PetriDish {
    /// Evaluate one device for this generation and return the occupant it leaves behind.
    ///
    /// Effects are queued as emissions and only land in the next buffer after every cell
    /// has acted, so trials never see another cell's in-progress state.
    pub(in crate::dish) fn step_device(&mut self, x: isize, y: isize, mut device: Device) -> Occupant {
        let activations = self.activations(device.frequency());
        if activations == 0 {
            return Occupant::Device(device);
        }

        let probability = f64::from(device.probability());
        let effect = effect_of(&device);

        if device.supply().is_exhausted() {
            if self.rng.random_bool(probability) {
                self.emissions.push(Emission {
                    source: (x, y),
                    target: (x, y),
                    effect,
                });
            }
            debug!(x, y, "device consumed");
            return Occupant::Empty;
        }

        'activations: for _ in 0..activations {
            for direction in device.spread().directions() {
                if device.supply().is_exhausted() {
                    break 'activations;
                }
                let (dx, dy) = direction.offset();
                let target = (x + dx, y + dy);
                if !self.grid.contains(target.0, target.1) {
                    continue;
                }
                if self.rng.random_bool(probability) {
                    self.emissions.push(Emission {
                        source: (x, y),
                        target,
                        effect,
                    });
                    device.supply_mut().consume();
                }
            }
        }
        Occupant::Device(device)
    }

    /// Activations granted this generation: the whole part of `frequency`, plus one more
    /// with probability equal to its fractional part. Capped at `MAX_DEVICE_FREQUENCY`.
    pub(in crate::dish) fn activations(&mut self, frequency: f32) -> u32 {
        if !frequency.is_finite() || frequency <= 0.0 {
            return 0;
        }
        let frequency = frequency.min(MAX_DEVICE_FREQUENCY);
        let whole = frequency.floor();
        let fraction = frequency - whole;
        let extra = fraction > 0.0 && self.rng.random::<f32>() < fraction;
        // `whole` lies in [0, MAX_DEVICE_FREQUENCY], so the conversion is exact.
        whole as u32 + u32::from(extra)
    }

    /// Apply queued device emissions to the next buffer in the order they were produced.
    ///
    /// Spawns replace whatever the target holds except another device, which is left intact.
    pub(in crate::dish) fn step_emission_phase(&mut self) {
        let emissions = std::mem::take(&mut self.emissions);
        for emission in &emissions {
            let (tx, ty) = emission.target;
            match emission.effect {
                Effect::Spawn(organism) => {
                    let Some(target) = self.grid.next_cell_mut(tx, ty) else {
                        continue;
                    };
                    if let Occupant::Device(_) = target.occupant {
                        debug!(x = tx, y = ty, "spawn blocked by device");
                        continue;
                    }
                    target.occupant = Occupant::Organism(organism);
                }
                Effect::Replicate => {
                    let (sx, sy) = emission.source;
                    let Some(source) = self.grid.cell(sx, sy) else {
                        continue;
                    };
                    let agents: Vec<_> = source.agents.values().copied().collect();
                    let energies: Vec<_> = source.energies.values().copied().collect();
                    self.replicate_into(tx, ty, &agents);
                    self.replicate_into(tx, ty, &energies);
                }
            }
        }
        self.emissions = emissions;
        self.emissions.clear();
    }

    fn replicate_into<K: SubstanceKind>(&mut self, x: isize, y: isize, copies: &[Substance<K>]) {
        let Some(cell) = self.grid.next_cell_mut(x, y) else {
            return;
        };
        for copy in copies {
            let combined = cell.intensity(copy.kind) + copy.intensity;
            match settle(copy.kind, combined) {
                Some(value) => cell.set_intensity(copy.kind, value),
                None => cell.remove_substance(copy.kind),
            }
        }
    }
}

fn effect_of(device: &Device) -> Effect {
    match device.kind() {
        DeviceKind::Replicator => Effect::Replicate,
        DeviceKind::Spawner { organism } => Effect::Spawn(organism),
    }
}
