#![package = "zoo.staff"]
#![module = "zoo"]

#[serializable]
struct Keeper {
    #[param]
    id: Integer,
    name: String,
}

#[serializable]
struct Enclosure<A> {
    resident: A,
    keepers: Intersection<Keeper, Named>,
}

#[serializable]
#[member_of(Enclosure)]
struct Gate {
    open: Boolean,
}
