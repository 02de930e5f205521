use async_poster::poster;

#[derive(Clone)]
struct Calculator {
    bias: i32,
}

#[poster]
impl Calculator {
    pub fn add(&self, a: i32, b: i32) -> i32 {
        a + b + self.bias
    }

    pub fn add2(&self, a: i32, b: i32) -> i32 {
        a - b
    }

    #[async_method(template = "My{0}Async")]
    pub fn add3(&self, a: i32, b: i32) -> i32 {
        a * b
    }

    #[async_method_ignore]
    pub fn reset(&mut self) {
        self.bias = 0;
    }
}

#[tokio::test]
async fn default_template_appends_async() {
    let calc = Calculator { bias: 1 };
    assert_eq!(calc.addAsync(2, 3).await.unwrap(), 6);
    assert_eq!(calc.add2Async(5, 3).await.unwrap(), 2);
}

#[tokio::test]
async fn method_template_overrides_the_default() {
    let calc = Calculator { bias: 0 };
    assert_eq!(calc.Myadd3Async(4, 5).await.unwrap(), 20);
}

struct Util;

#[poster]
impl Util {
    pub fn double(n: u64) -> u64 {
        n * 2
    }
}

#[tokio::test]
async fn associated_functions_get_associated_wrappers() {
    assert_eq!(Util::doubleAsync(21).await.unwrap(), 42);
}

#[derive(Clone)]
struct Faulty;

#[poster]
impl Faulty {
    pub fn explode(&self) {
        panic!("boom");
    }
}

#[tokio::test]
async fn panics_surface_through_the_handle() {
    let faulty = Faulty;
    let error = faulty.explodeAsync().await.unwrap_err();
    assert!(error.is_panic());
}

#[derive(Clone)]
struct Renamed;

#[poster(template = "{0}_blocking")]
impl Renamed {
    pub fn work(&self) -> u8 {
        7
    }
}

#[tokio::test]
async fn type_template_renames_every_wrapper() {
    assert_eq!(Renamed.work_blocking().await.unwrap(), 7);
}

#[derive(Clone)]
struct Stacked;

#[poster]
#[poster(template = "{0}Deferred")]
impl Stacked {
    pub fn add(&self, a: i32, b: i32) -> i32 {
        a + b
    }
}

#[tokio::test]
async fn repeated_markers_each_generate_their_wrappers() {
    let stacked = Stacked;
    assert_eq!(stacked.addAsync(1, 2).await.unwrap(), 3);
    assert_eq!(stacked.addDeferred(3, 4).await.unwrap(), 7);
}

#[derive(Clone)]
struct Remote {
    id: u32,
}

#[poster(target = "Remote")]
impl Remote {
    pub fn ping(&self, n: u32) -> u32 {
        self.id + n
    }
}

#[tokio::test]
async fn target_markers_emit_free_functions() {
    let remote = Remote { id: 40 };
    assert_eq!(pingAsync(remote, 2).await.unwrap(), 42);
}

#[poster]
trait Summing {
    fn sum(&self, a: i32, b: i32) -> i32;
}

struct Pair;

impl Summing for Pair {
    fn sum(&self, a: i32, b: i32) -> i32 {
        a + b
    }
}

impl SummingAsyncExt for Pair {
    #[allow(non_snake_case)]
    fn sumAsync(&self, a: i32, b: i32) -> async_poster::runtime::JoinHandle<i32> {
        async_poster::runtime::spawn_blocking(move || a + b)
    }
}

#[tokio::test]
async fn trait_markers_declare_a_companion_extension_trait() {
    let pair = Pair;
    assert_eq!(pair.sumAsync(20, 22).await.unwrap(), 42);
}
