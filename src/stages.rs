// PlacentaFlow - Sequential Placental Circulation Animator
// Licensed under MIT License

//! Static stage table for the nine phases of placental circulation.

pub const STAGE_COUNT: usize = 9;
pub const FINAL_STAGE: usize = STAGE_COUNT - 1;

pub struct StageDescriptor {
    pub title: &'static str,
    pub explanation: &'static str,
}

pub static STAGES: [StageDescriptor; STAGE_COUNT] = [
    StageDescriptor {
        title: "Initial state - Placenta structure",
        explanation: "The placenta is a specialized organ that forms the interface between \
            maternal and fetal circulations. It has a maternal side (decidua basalis) and a \
            fetal side (chorionic plate) with villous trees extending between them.",
    },
    StageDescriptor {
        title: "Stage 1: Maternal blood enters from spiral arteries",
        explanation: "Maternal blood enters the placenta through spiral arteries in the \
            uterine wall. These arteries have been modified during placental development to \
            be low-resistance vessels that deliver oxygenated blood at low pressure.",
    },
    StageDescriptor {
        title: "Stage 2: Maternal blood fills intervillous space",
        explanation: "Unlike typical circulation, maternal blood doesn't flow within blood \
            vessels in the placenta. Instead, it flows freely throughout the intervillous \
            space, bathing the villous trees containing fetal circulation.",
    },
    StageDescriptor {
        title: "Stage 3: Fetal blood enters through umbilical arteries",
        explanation: "Deoxygenated fetal blood travels from the fetus through the umbilical \
            cord via two umbilical arteries. In fetal circulation, arteries carry \
            deoxygenated blood while veins carry oxygenated blood - the opposite of normal \
            circulation.",
    },
    StageDescriptor {
        title: "Stage 4: Fetal blood flows through villous trees",
        explanation: "Fetal blood flows through the chorionic plate and descends into the \
            branching villous trees. Unlike maternal blood, fetal blood remains within blood \
            vessels at all times, flowing at higher pressure through the convoluted network.",
    },
    StageDescriptor {
        title: "Stage 5: Exchange of gases and nutrients occurs",
        explanation: "At the terminal villi, only a thin membrane separates maternal and \
            fetal blood, allowing exchange of oxygen, nutrients, and waste products. Oxygen \
            diffuses from maternal to fetal blood, while carbon dioxide and waste move in \
            the opposite direction.",
    },
    StageDescriptor {
        title: "Stage 6: Oxygenated fetal blood returns through umbilical vein",
        explanation: "After receiving oxygen from maternal blood, the now-oxygenated fetal \
            blood returns through the villous vessels, converges in the chorionic plate, and \
            returns to the fetus through the single umbilical vein.",
    },
    StageDescriptor {
        title: "Stage 7: Deoxygenated maternal blood exits through decidual veins",
        explanation: "After delivering oxygen and nutrients, the now-deoxygenated maternal \
            blood exits the intervillous space through decidual veins in the uterine wall, \
            completing the maternal side of placental circulation.",
    },
    StageDescriptor {
        title: "Stage 8: Complete circulation (all flows active)",
        explanation: "The complete placental circulation involves two separate non-mixing \
            circulations: (1) Maternal blood flowing freely in the intervillous space, and \
            (2) Fetal blood contained within vessels in the villous trees. This unique \
            arrangement maximizes surface area for exchange while keeping the circulations \
            separate.",
    },
];

pub fn descriptor(stage: usize) -> &'static StageDescriptor {
    &STAGES[stage.min(FINAL_STAGE)]
}
