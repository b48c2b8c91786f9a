#![package = "zoo.animals"]
#![module = "zoo"]

trait Named {}

trait Feeder<F>: Named {}

#[serializable]
#[abstract_class]
#[satisfies(Feeder<F>)]
struct Animal<F> {
    #[param]
    name: String,
    food: F,
    #[formal]
    legs: Integer,
    #[transient]
    hunger: Float,
}

#[serializable]
#[extends(Animal<String>)]
struct Cat {
    lives: Integer,
    #[late]
    owner: Union<Keeper, Nothing>,
}

#[extends(Cat)]
struct Lion {
    mane: Boolean,
}

#[serializable]
#[extends(Lion)]
struct Cub {
    age: Integer,
    #[setter]
    age: Integer,
}

impl Cat {
    fn purr(&self) {}
}
